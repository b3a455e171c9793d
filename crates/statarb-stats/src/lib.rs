pub mod cointegration;
pub mod rolling;

pub use cointegration::refresh as refresh_cointegration;
pub use rolling::SpreadWindow;
