pub mod error;
pub mod instance;
pub mod instance_parser;
pub mod mip_trait;
pub mod microlp_engine;
pub mod solution;
pub mod relaxation;
pub mod min_cut;
pub mod flow_network;
pub mod separation;
pub mod cutting_plane;
pub mod stats;
