pub mod concept_map;
