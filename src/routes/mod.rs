pub(crate) mod favorites;
pub(crate) mod health;
pub(crate) mod stocks;
