// Adapters layer: serialization surfaces around the document model (CSV
// projection, XML dump). Storage backends live under src/config.

pub mod markup;
pub mod tabular;
