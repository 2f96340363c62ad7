mod assemble;
mod layout;
mod pdf;
mod spec;

pub use assemble::DocumentAssembler;
pub use spec::{
    Align, ContentBlock, DocumentSpec, ImageSource, Margins, Orientation, PageSetup, PageSize,
};
