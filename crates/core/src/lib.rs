pub mod collection;
pub mod config;
pub mod error;
pub mod policy;

pub use collection::{Collection, Entries, Entry, Key, Shape};
pub use config::{FanoutConfig, IterationConfig, ViolationConfig, load_dotenv};
pub use error::*;
pub use policy::Policy;
