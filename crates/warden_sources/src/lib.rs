//! The four source fetchers: NVD (per-CVE), KEV (whole catalog, fetched once
//! per scan), EPSS (per-CVE), and the local SSVC stub.

pub mod client;
pub mod epss;
pub mod kev;
pub mod nvd;
pub mod ssvc;

pub use client::SourceClients;
pub use epss::EpssClient;
pub use kev::{KevCatalog, KevClient};
pub use nvd::{NvdClient, NvdRecord};
