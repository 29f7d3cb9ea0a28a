//! A backend that stores nothing and answers every call with a canned reply.
//! Useful to try the frontend, and as a template for new backends.

use super::{Adapter, EditOptions, ListOptions, Options};
use crate::callable::{Callable, Dispatch};
use crate::error::{Result, WriteDownError};
use crate::model::{CmdMessage, CmdResult};

#[derive(Debug, Default)]
pub struct ExampleAdapter;

impl ExampleAdapter {
    pub fn create(_options: &Options) -> Result<Box<dyn Adapter>> {
        Ok(Box::new(ExampleAdapter))
    }
}

impl Adapter for ExampleAdapter {
    fn name(&self) -> &'static str {
        "example"
    }

    fn search(&self, _pattern: &str) -> Result<CmdResult> {
        Ok(CmdResult::message(CmdMessage::info("Nothing found!")))
    }

    fn list(
        &self,
        _options: &ListOptions,
        _filter: Option<&Callable>,
        _dispatcher: &dyn Dispatch,
    ) -> Result<CmdResult> {
        Ok(CmdResult::default().with_lines(vec!["print result to screen".to_string()]))
    }

    fn add(&self, _content: &str) -> Result<CmdResult> {
        Err(WriteDownError::not_supported(self.name(), "add"))
    }

    fn edit(&self, _id: &str, _options: &EditOptions) -> Result<CmdResult> {
        Ok(CmdResult::message(CmdMessage::success("Edited.")))
    }

    fn archive(&self, id: &str) -> Result<CmdResult> {
        Ok(CmdResult::message(CmdMessage::success(format!(
            "{} archived.",
            id
        ))))
    }

    fn remove(&self, id: &str, trash: bool) -> Result<CmdResult> {
        let verb = if trash { "trashed" } else { "removed" };
        Ok(CmdResult::message(CmdMessage::success(format!(
            "{} {}",
            id, verb
        ))))
    }
}
