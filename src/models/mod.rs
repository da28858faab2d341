pub mod block;
pub mod grade;
pub mod request;

pub use block::{Block, Stage};
pub use grade::{Grade, GradeSheet};
pub use request::{Command, GatewayRequest};
