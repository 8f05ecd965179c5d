pub mod postgres_results;
