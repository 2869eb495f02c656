// Application layer: storage-backed pipelines for each generator.

pub mod pipelines;
