pub mod client;
pub mod errors;

pub use client::{ensure_pdf, InvoiceApi, InvoiceApiClient, INVALID_PDF, PDF_MIME};
#[cfg(any(test, feature = "testing"))]
pub use client::MockInvoiceApi;
pub use errors::ApiError;
