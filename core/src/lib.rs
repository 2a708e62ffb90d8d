//! One-shot, synchronous HTTP requests from declarative descriptions.
//!
//! # Overview
//! A `RequestDescription` lists options by symbolic name (`url`, `method`,
//! `data`, `headers`, ...) or by raw transport code. `Executor::execute`
//! validates it, translates the names into transport options, performs one
//! blocking call, and returns the response body.
//!
//! # Design
//! - Validation happens before a transport handle exists.
//! - The translation table in `translate` is the only name-to-code mapping.
//! - `Transport` is the seam to the HTTP library; `UreqTransport` is the
//!   bundled implementation, tests plug in their own.
//! - HTTP status codes are not interpreted. A 500 body is a success.
//!
//! ```no_run
//! use send_core::{HttpMethod, RequestDescription};
//!
//! let request = RequestDescription::new("http://localhost:3000/echo")
//!     .method(HttpMethod::Post)
//!     .data("name=value")
//!     .header("Accept: application/json")
//!     .timeout_ms(2_000);
//! match send_core::execute(&request) {
//!     Ok(body) => println!("{body}"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

pub mod error;
pub mod executor;
pub mod http;
pub mod option;
pub mod request;
pub mod translate;
pub mod transport;
pub mod ureq_transport;

pub use error::{InvalidRequest, SendError, TransportError};
pub use executor::Executor;
pub use http::HttpMethod;
pub use option::{OptionCode, OptionValue, TransportOption};
pub use request::{RequestDescription, RequestOption};
pub use translate::{translate, OptionSet};
pub use transport::{Transport, TransportHandle};
pub use ureq_transport::UreqTransport;

/// Execute `request` with the default ureq-backed executor.
pub fn execute(request: &RequestDescription) -> Result<String, SendError> {
    Executor::default().execute(request)
}
