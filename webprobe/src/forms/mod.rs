//! HTML forms found in responses
//!
//! [`Form::parse`] scans one `<form>...</form>` block into [`Field`]s, each
//! carrying the state a browser would keep for that control. Setting values
//! is validated per control kind; [`Form::submit_fields`] produces the
//! ordered pair list a browser would send.
//!
//! # Examples
//!
//! ```rust
//! use webprobe::forms::{Form, Value};
//!
//! let mut form = Form::parse(
//!     r#"<form action="/pick">
//!          <select name="fruit"><option>Apple</option><option>Pear</option></select>
//!        </form>"#,
//! )
//! .unwrap();
//! assert_eq!(form.field("fruit").unwrap().value(), Some(Value::from("Apple")));
//!
//! assert!(form.set("fruit", "Plum").is_err());
//! form.set("fruit", "Pear").unwrap();
//! assert_eq!(form.field("fruit").unwrap().text().as_deref(), Some("Pear"));
//! ```

mod collection;
mod field;
mod form;
mod upload;

pub use collection::{FormKey, Forms};
pub use field::{
    Choice, Field, FieldKind, MultiChoice, SelectOption, Selection, SingleChoice, Value,
};
pub use form::{Form, Submission, SubmitValue};
pub use upload::{Upload, UploadContent, UploadField};
