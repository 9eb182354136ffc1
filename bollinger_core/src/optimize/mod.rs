pub mod grid_search;
