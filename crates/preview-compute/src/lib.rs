pub mod assembler;
pub mod http;
pub mod protocol;
pub mod service;
pub mod transformer;

pub use assembler::StageAssembler;
pub use http::HttpComputeService;
pub use protocol::{
    parse_assemble_response, parse_postprocess_response, AssembleRequest, PostprocessRequest,
    RulesEnvelope,
};
pub use service::ComputeService;
pub use transformer::ViewTransformer;
