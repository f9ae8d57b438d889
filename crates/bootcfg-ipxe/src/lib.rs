//! bootcfg network boot payloads
//!
//! Turns a Profile's boot parameters into the payloads network boot
//! firmware and tooling consume.
//!
//! # Formats
//!
//! - **iPXE**: a `#!ipxe` script with `kernel`, `initrd` and `boot` lines
//! - **Bootstrap**: the first script iPXE fetches, which chains back to the
//!   server with the machine's labels as query parameters
//! - **Pixiecore**: the JSON document served by the Pixiecore API
//!
//! # Example
//!
//! ```
//! use bootcfg_ipxe::boot_script;
//! use bootcfg_model::Boot;
//!
//! let boot = Boot::new("/image/kernel")
//!     .with_initrd("/image/initrd")
//!     .with_arg("console", "ttyS0");
//!
//! let script = boot_script(&boot).unwrap();
//! assert!(script.starts_with("#!ipxe\n"));
//! ```

pub mod error;
pub mod pixiecore;
pub mod script;

pub use error::*;
pub use pixiecore::*;
pub use script::*;
