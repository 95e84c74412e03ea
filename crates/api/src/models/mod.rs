//! Domain models returned by repositories and serialized by routes.

pub mod bank;
pub mod order;
pub mod payment;
pub mod product;
pub mod report;
pub mod response;
pub mod user;

pub use bank::{BankAccount, BankAccountInput};
pub use order::{NewOrder, Order, OrderSummary, Personalization};
pub use payment::{NewPayment, Payment, PaymentSummary};
pub use product::{Product, ProductInput};
pub use report::{DailyReportRow, DashboardStats, MonthlyReportRow, SalesReportRow};
pub use response::ApiResponse;
pub use user::{ProfileUpdate, User};
