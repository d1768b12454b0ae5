pub mod base;
pub mod jd;
