// src/config/mod.rs
pub mod triangulate;

pub use triangulate::{
    FeedCfg, Limits, Matching, NarrativeCfg, Output, Server, TriangulateConfig,
    DEFAULT_CONFIG_PATH, ENV_BIND, ENV_CONFIG_PATH, ENV_MAX_EVENTS, ENV_OUTPUT_PATH,
};
