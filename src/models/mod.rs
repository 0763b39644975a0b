mod stock;

pub use stock::{FavoriteStatusResponse, FavoriteStock, SearchParams, Stock};
