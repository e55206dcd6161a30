//! # HTTP Routes
//!
//! One module per resource, each exporting its own `Router`, merged under
//! `/api` by [`api_router`]. Handlers validate input, call into pos-db, and
//! let `ApiError` conversions produce the wire shape.
//!
//! ## Route Table
//! ```text
//! /api/products        GET list, POST create
//! /api/products/:id    GET, PUT (partial), DELETE
//! /api/customers       GET list, POST create
//! /api/customers/:id   GET, PUT (partial), DELETE
//! /api/discounts       GET list, POST create
//! /api/discounts/:id   GET, PUT (partial), DELETE
//! /api/sales           POST checkout, GET list
//! /api/sales/:id       GET (with items)
//! /api/users/register  POST
//! /api/users/login     POST
//! /api/users           GET list
//! /api/users/:id       DELETE
//! /api/reports/sales   GET ?start_date&end_date
//! ```

use axum::Router;

use crate::AppState;

pub mod customer;
pub mod discount;
pub mod product;
pub mod report;
pub mod sale;
pub mod user;

/// All API routes, to be nested under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", product::router())
        .nest("/customers", customer::router())
        .nest("/discounts", discount::router())
        .nest("/sales", sale::router())
        .nest("/users", user::router())
        .nest("/reports", report::router())
}
