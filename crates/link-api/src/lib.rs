//! # link-api
//!
//! HTTP API layer for the payment-links service.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The link lifecycle controller and auto-unlock scheduler
//! - Admin, shopper, and webhook endpoints
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/admin` | Link creation form |
//! | POST | `/admin` | Create a payment link |
//! | GET | `/checkout?paymentId=` | Hosted checkout page |
//! | GET | `/result?paymentId=` | Shopper-return landing page |
//! | GET | `/status?paymentId=` | Status JSON for polling |
//! | POST | `/mark-processing` | In-component completion event |
//! | POST | `/webhook` | Provider payment notifications |

pub mod handlers;
pub mod lifecycle;
pub mod routes;
pub mod state;

pub use lifecycle::{CheckoutOutcome, CreatedLink, LifecycleController, NewLink, UnlockScheduler};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
