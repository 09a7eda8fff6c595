pub mod envfile;
pub mod error;
pub mod generator;
pub mod io;
pub mod migrate;
pub mod paths;
pub mod probe;
pub mod registry;
pub mod resolve;
pub mod scanner;
pub mod validator;

pub use error::{PortsError, Result};
pub use registry::PortBinding;
