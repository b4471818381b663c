// Attachment intake. Uploaded files are checked against the upload policy and
// land in the session's pending buffer.

pub mod handlers;
pub mod reader;
pub mod validator;
