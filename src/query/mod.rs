pub mod ast;
pub mod validator;
pub mod matcher;
