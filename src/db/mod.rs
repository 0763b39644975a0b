pub mod favorite_queries;
