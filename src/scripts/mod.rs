pub mod index_catalog;
