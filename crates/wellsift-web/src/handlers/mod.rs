pub mod wells;
