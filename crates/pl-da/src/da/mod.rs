pub mod err;
pub mod hl;
pub mod ll;
