pub mod jmdict;
pub mod pos_map;
pub mod trace_init;
pub mod vocab;
