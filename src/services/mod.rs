pub mod summaries;
