// Application layer: ports and the use cases behind each command

pub mod constraints_use_case;
pub mod normalize_use_case;
pub mod ports;
pub mod query_use_case;
pub mod recommend_use_case;
