pub mod apply;
pub mod compression;
pub mod elliptic;
