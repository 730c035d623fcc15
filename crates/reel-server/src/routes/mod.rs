pub mod chords;
pub mod clips;
pub mod drum_maps;
pub mod export;
pub mod polyrhythms;
pub mod projects;
pub mod segments;
