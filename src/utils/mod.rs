pub mod arg_aliases;
pub mod redact;
pub mod suggest;
pub mod text;
