//! Form controls and their editable state
//!
//! Every control found in a form becomes a [`Field`]. The kind of control
//! is a closed enum chosen by [`FieldKind::classify`] from the tag name and
//! `type` attribute; the state each kind carries decides what a browser
//! would submit for it.

use std::collections::HashMap;
use std::fmt;

use super::upload::Upload;
use crate::error::{Result, WebProbeError};

/// A value read from, or written to, a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A single string
    Text(String),
    /// Several strings (multiple select)
    List(Vec<String>),
    /// Checkbox state
    Checked(bool),
    /// File upload
    Upload(Upload),
}

impl Value {
    const fn describe(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Checked(_) => "bool",
            Self::Upload(_) => "upload",
        }
    }

    fn into_list(self) -> Option<Vec<String>> {
        match self {
            Self::List(values) => Some(values),
            Self::Text(value) => Some(vec![value]),
            Self::Checked(_) | Self::Upload(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Checked(b)
    }
}

impl From<Upload> for Value {
    fn from(upload: Upload) -> Self {
        Self::Upload(upload)
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Value {
    fn from(values: &[&str]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Value {
    fn from(values: [&str; N]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_string()).collect())
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Self::Text(n.to_string())
                }
            }
        )*
    };
}

value_from_number!(i32, i64, u8, u16, u32, u64, usize, f64);

/// One `<option>` of a select, or one radio button of a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    value: Option<String>,
    text: String,
    selected: bool,
}

impl SelectOption {
    /// Create an option
    ///
    /// `value` is the `value` attribute if present; `text` is what the
    /// browser would submit without one.
    #[must_use]
    pub fn new(value: Option<String>, text: impl Into<String>, selected: bool) -> Self {
        Self {
            value,
            text: text.into(),
            selected,
        }
    }

    /// Submitted value: the `value` attribute, else the option text
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }

    /// The `value` attribute exactly as written
    #[must_use]
    pub fn value_attr(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Displayed text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the markup marks it `selected` / `checked`
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }
}

/// Selection state of a choice field
///
/// A validated set always replaces a forced value and vice versa, so the
/// value read back is whichever happened last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<I, F> {
    /// Nothing assigned yet; markup defaults apply
    #[default]
    Default,
    /// Chosen among the declared options
    Validated(I),
    /// Pinned to an arbitrary value by `force_value`
    Forced(F),
}

/// Options plus the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice<I, F> {
    options: Vec<SelectOption>,
    selection: Selection<I, F>,
}

impl<I, F> Choice<I, F> {
    const fn new() -> Self {
        Self {
            options: Vec::new(),
            selection: Selection::Default,
        }
    }

    /// Declared options in document order
    #[must_use]
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    /// Current selection state
    #[must_use]
    pub const fn selection(&self) -> &Selection<I, F> {
        &self.selection
    }

    fn options_repr(&self) -> String {
        self.options
            .iter()
            .map(|o| format!("{:?}", o.value()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Single-value choice (select, radio group)
pub type SingleChoice = Choice<usize, String>;

/// Multi-value choice (`<select multiple>`)
pub type MultiChoice = Choice<Vec<usize>, Vec<String>>;

impl SingleChoice {
    fn select(&mut self, value: &str) -> Result<()> {
        let index = self
            .options
            .iter()
            .position(|o| o.value() == value)
            .ok_or_else(|| WebProbeError::OptionNotFound {
                value: format!("{value:?}"),
                options: self.options_repr(),
            })?;
        self.selection = Selection::Validated(index);
        Ok(())
    }

    fn current(&self, fall_back_to_first: bool) -> Option<String> {
        match &self.selection {
            Selection::Forced(value) => Some(value.clone()),
            Selection::Validated(index) => Some(self.options[*index].value().to_string()),
            Selection::Default => self
                .options
                .iter()
                .find(|o| o.selected)
                .or_else(|| self.options.first().filter(|_| fall_back_to_first))
                .map(|o| o.value().to_string()),
        }
    }
}

impl MultiChoice {
    fn select(&mut self, values: Vec<String>) -> Result<()> {
        let mut wanted = values;
        let mut indices = Vec::new();
        for (i, option) in self.options.iter().enumerate() {
            if let Some(pos) = wanted.iter().position(|v| v == option.value()) {
                wanted.remove(pos);
                indices.push(i);
            }
        }
        if !wanted.is_empty() {
            return Err(WebProbeError::OptionNotFound {
                value: wanted.join(", "),
                options: self.options_repr(),
            });
        }
        self.selection = Selection::Validated(indices);
        Ok(())
    }

    fn current(&self) -> Option<Vec<String>> {
        let values: Vec<String> = match &self.selection {
            Selection::Forced(values) => values.clone(),
            Selection::Validated(indices) => indices
                .iter()
                .map(|i| self.options[*i].value().to_string())
                .collect(),
            Selection::Default => self
                .options
                .iter()
                .filter(|o| o.selected)
                .map(|o| o.value().to_string())
                .collect(),
        };
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }
}

/// Kind of control and its state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// `<input>` of type text, password, email, number, ... (and unknown types)
    Text {
        /// Current value
        value: String,
    },
    /// `<input type="hidden">`
    Hidden {
        /// Current value
        value: String,
    },
    /// `<textarea>`
    Textarea {
        /// Current value
        value: String,
    },
    /// `<input type="checkbox">`
    Checkbox {
        /// `value` attribute, sent as `"on"` when absent
        on_value: Option<String>,
        /// Whether it is checked
        checked: bool,
    },
    /// Group of `<input type="radio">` sharing a name
    Radio(SingleChoice),
    /// `<select>`
    Select(SingleChoice),
    /// `<select multiple>`
    MultipleSelect(MultiChoice),
    /// `<input type="file">`
    File {
        /// Current upload
        upload: Option<Upload>,
    },
    /// `<input type="submit|button|image|reset">` and `<button>`
    Submit {
        /// Value sent when this control is the one pressed
        value: Option<String>,
    },
}

impl FieldKind {
    /// Build the initial state for a control
    ///
    /// | tag | `type` | kind |
    /// |---|---|---|
    /// | `select` | (`multiple` present) | `MultipleSelect` |
    /// | `select` | | `Select` |
    /// | `textarea` | | `Textarea` |
    /// | `button` | any | `Submit` |
    /// | `input` | `hidden` | `Hidden` |
    /// | `input` | `checkbox` | `Checkbox` |
    /// | `input` | `radio` | `Radio` |
    /// | `input` | `file` | `File` |
    /// | `input` | `submit`, `button`, `image`, `reset` | `Submit` |
    /// | `input` | anything else or absent | `Text` |
    #[must_use]
    pub fn classify(tag: &str, attrs: &HashMap<String, String>) -> Self {
        let value = attrs.get("value").cloned();
        match tag {
            "select" if attrs.contains_key("multiple") => Self::MultipleSelect(Choice::new()),
            "select" => Self::Select(Choice::new()),
            "textarea" => Self::Textarea {
                value: value.unwrap_or_default(),
            },
            "button" => Self::Submit { value },
            _ => {
                let input_type = attrs
                    .get("type")
                    .map_or_else(|| "text".to_string(), |t| t.to_lowercase());
                match input_type.as_str() {
                    "hidden" => Self::Hidden {
                        value: value.unwrap_or_default(),
                    },
                    "checkbox" => Self::Checkbox {
                        on_value: value,
                        checked: attrs.contains_key("checked"),
                    },
                    "radio" => Self::Radio(Choice::new()),
                    "file" => Self::File { upload: None },
                    "submit" | "button" | "image" | "reset" => Self::Submit { value },
                    _ => Self::Text {
                        value: value.unwrap_or_default(),
                    },
                }
            }
        }
    }

    const fn class_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "Text",
            Self::Hidden { .. } => "Hidden",
            Self::Textarea { .. } => "Textarea",
            Self::Checkbox { .. } => "Checkbox",
            Self::Radio(_) => "Radio",
            Self::Select(_) => "Select",
            Self::MultipleSelect(_) => "MultipleSelect",
            Self::File { .. } => "File",
            Self::Submit { .. } => "Submit",
        }
    }
}

/// One form control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    tag: String,
    name: Option<String>,
    pos: usize,
    id: Option<String>,
    attrs: HashMap<String, String>,
    kind: FieldKind,
}

impl Field {
    /// Create a field for a control found at byte offset `pos`
    ///
    /// `attrs` should not contain `name`; it is passed separately.
    #[must_use]
    pub fn new(
        tag: impl Into<String>,
        name: Option<String>,
        pos: usize,
        attrs: HashMap<String, String>,
    ) -> Self {
        let tag = tag.into();
        let kind = FieldKind::classify(&tag, &attrs);
        let id = attrs.get("id").filter(|id| !id.is_empty()).cloned();
        Self {
            tag,
            name,
            pos,
            id,
            attrs,
            kind,
        }
    }

    /// Tag name (`input`, `select`, `textarea`, `button`)
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Control name, absent for nameless buttons
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Byte offset of the start tag within the form text
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// `id` attribute
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Attributes of the start tag, without `name`
    #[must_use]
    pub const fn attrs(&self) -> &HashMap<String, String> {
        &self.attrs
    }

    /// A single attribute
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Kind and state
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Declared options of a select or radio group (empty otherwise)
    #[must_use]
    pub fn options(&self) -> &[SelectOption] {
        match &self.kind {
            FieldKind::Radio(choice) | FieldKind::Select(choice) => &choice.options,
            FieldKind::MultipleSelect(choice) => &choice.options,
            _ => &[],
        }
    }

    pub(crate) fn push_option(&mut self, option: SelectOption) -> bool {
        match &mut self.kind {
            FieldKind::Radio(choice) | FieldKind::Select(choice) => choice.options.push(option),
            FieldKind::MultipleSelect(choice) => choice.options.push(option),
            _ => return false,
        }
        true
    }

    /// Whether this is a submit-type control
    #[must_use]
    pub const fn is_submit(&self) -> bool {
        matches!(self.kind, FieldKind::Submit { .. })
    }

    /// Whether this is a hidden input
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        matches!(self.kind, FieldKind::Hidden { .. })
    }

    /// Whether this is a file input
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, FieldKind::File { .. })
    }

    /// Current value, or `None` when the control would not be submitted
    ///
    /// Submit-type controls always report `None`; see
    /// [`Field::value_if_submitted`].
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        match &self.kind {
            FieldKind::Text { value }
            | FieldKind::Hidden { value }
            | FieldKind::Textarea { value } => Some(Value::Text(value.clone())),
            FieldKind::Checkbox { on_value, checked } => {
                let on = on_value.as_deref().unwrap_or("on");
                checked.then(|| Value::Text(on.to_string()))
            }
            FieldKind::Radio(choice) => choice.current(false).map(Value::Text),
            FieldKind::Select(choice) => choice.current(true).map(Value::Text),
            FieldKind::MultipleSelect(choice) => choice.current().map(Value::List),
            FieldKind::File { upload } => upload
                .as_ref()
                .filter(|u| !u.is_empty())
                .cloned()
                .map(Value::Upload),
            FieldKind::Submit { .. } => None,
        }
    }

    /// Current value as text, for single-valued controls
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self.value()? {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Value sent when this submit-type control is the one pressed
    #[must_use]
    pub fn value_if_submitted(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Submit { value } => Some(value.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    /// Checkbox state (`false` for every other kind)
    #[must_use]
    pub const fn checked(&self) -> bool {
        matches!(self.kind, FieldKind::Checkbox { checked: true, .. })
    }

    /// Assign a value, validating it against the control
    ///
    /// - text-like controls take any text;
    /// - checkboxes take a bool (or text, non-empty meaning checked);
    /// - selects and radios take one of their option values;
    /// - multiple selects take a list of option values and replace the
    ///   whole selection;
    /// - file inputs take an [`Upload`] or a filename to read from disk.
    ///
    /// # Errors
    ///
    /// [`WebProbeError::OptionNotFound`] for values outside the declared
    /// options, [`WebProbeError::ImmutableField`] for submit-type controls,
    /// [`WebProbeError::TypeMismatch`] for a value of the wrong shape. The
    /// field is left unchanged on error.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let actual = value.describe();
        match &mut self.kind {
            FieldKind::Text { value: current }
            | FieldKind::Hidden { value: current }
            | FieldKind::Textarea { value: current } => match value {
                Value::Text(text) => *current = text,
                _ => return Err(self.mismatch("text", actual)),
            },
            FieldKind::Checkbox { checked, .. } => match value {
                Value::Checked(b) => *checked = b,
                Value::Text(text) => *checked = !text.is_empty(),
                _ => return Err(self.mismatch("bool", actual)),
            },
            FieldKind::Radio(choice) | FieldKind::Select(choice) => match value {
                Value::Text(text) => choice.select(&text)?,
                _ => return Err(self.mismatch("text", actual)),
            },
            FieldKind::MultipleSelect(choice) => match value.into_list() {
                Some(values) => choice.select(values)?,
                None => return Err(self.mismatch("list", actual)),
            },
            FieldKind::File { upload } => match value {
                Value::Upload(u) => *upload = Some(u),
                Value::Text(filename) => *upload = Some(Upload::new(filename)),
                _ => return Err(self.mismatch("upload", actual)),
            },
            FieldKind::Submit { .. } => {
                return Err(WebProbeError::ImmutableField {
                    tag: self.tag.clone(),
                    name: self.name.clone().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    /// Set the checked state of a checkbox
    ///
    /// # Errors
    ///
    /// [`WebProbeError::TypeMismatch`] when the field is not a checkbox.
    pub fn set_checked(&mut self, checked: bool) -> Result<()> {
        match &mut self.kind {
            FieldKind::Checkbox { checked: current, .. } => {
                *current = checked;
                Ok(())
            }
            _ => Err(self.mismatch("checkbox", self.kind.class_name())),
        }
    }

    /// Assign a value without validation
    ///
    /// Selects, radios and multiple selects report the forced value until
    /// the next successful [`Field::set`]. Other controls take the value
    /// directly, including hidden inputs and the declared value of submit
    /// buttons.
    ///
    /// # Errors
    ///
    /// [`WebProbeError::TypeMismatch`] for a value of the wrong shape.
    pub fn force_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let actual = value.describe();
        match &mut self.kind {
            FieldKind::Radio(choice) | FieldKind::Select(choice) => match value {
                Value::Text(text) => choice.selection = Selection::Forced(text),
                _ => return Err(self.mismatch("text", actual)),
            },
            FieldKind::MultipleSelect(choice) => match value.into_list() {
                Some(values) => choice.selection = Selection::Forced(values),
                None => return Err(self.mismatch("list", actual)),
            },
            FieldKind::Checkbox { on_value, checked } => match value {
                Value::Text(text) => *on_value = Some(text),
                Value::Checked(b) => *checked = b,
                _ => return Err(self.mismatch("text", actual)),
            },
            FieldKind::Submit { value: current } => match value {
                Value::Text(text) => *current = Some(text),
                _ => return Err(self.mismatch("text", actual)),
            },
            _ => self.set(value)?,
        }
        Ok(())
    }

    fn mismatch(&self, expected: &str, actual: &str) -> WebProbeError {
        WebProbeError::TypeMismatch {
            expected: format!("{expected} for {self}"),
            actual: actual.to_string(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} name=\"{}\"",
            self.kind.class_name(),
            self.name.as_deref().unwrap_or("")
        )?;
        if let Some(id) = &self.id {
            write!(f, " id=\"{id}\"")?;
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn field(tag: &str, pairs: &[(&str, &str)]) -> Field {
        Field::new(tag, Some("f".into()), 0, attrs(pairs))
    }

    fn select(options: &[(Option<&str>, &str, bool)], multiple: bool) -> Field {
        let mut a = Vec::new();
        if multiple {
            a.push(("multiple", ""));
        }
        let mut f = field("select", &a);
        for (value, text, selected) in options {
            let option = SelectOption::new(value.map(str::to_string), *text, *selected);
            assert!(f.push_option(option));
        }
        f
    }

    #[test]
    fn test_classify_table() {
        assert!(matches!(field("input", &[]).kind(), FieldKind::Text { .. }));
        assert!(matches!(
            field("input", &[("type", "PASSWORD")]).kind(),
            FieldKind::Text { .. }
        ));
        assert!(field("input", &[("type", "hidden")]).is_hidden());
        assert!(field("input", &[("type", "image")]).is_submit());
        assert!(field("button", &[]).is_submit());
        assert!(field("input", &[("type", "file")]).is_file());
        assert!(matches!(
            field("select", &[("multiple", "")]).kind(),
            FieldKind::MultipleSelect(_)
        ));
    }

    #[test]
    fn test_text_defaults_to_empty() {
        assert_eq!(field("input", &[]).text().as_deref(), Some(""));
        assert_eq!(
            field("input", &[("value", "bar")]).text().as_deref(),
            Some("bar")
        );
    }

    #[test]
    fn test_checkbox_defaults() {
        let unchecked = field("input", &[("type", "checkbox")]);
        assert_eq!(unchecked.value(), None);
        assert!(!unchecked.checked());

        let checked = field("input", &[("type", "checkbox"), ("checked", "")]);
        assert_eq!(checked.text().as_deref(), Some("on"));

        let valued = field(
            "input",
            &[("type", "checkbox"), ("checked", ""), ("value", "yes")],
        );
        assert_eq!(valued.text().as_deref(), Some("yes"));
    }

    #[test]
    fn test_checkbox_toggle() {
        let mut f = field("input", &[("type", "checkbox")]);
        f.set(true).unwrap();
        assert_eq!(f.text().as_deref(), Some("on"));
        f.set(false).unwrap();
        assert_eq!(f.value(), None);
        f.set_checked(true).unwrap();
        assert!(f.checked());
    }

    #[test]
    fn test_select_defaults_to_selected_then_first() {
        let f = select(
            &[(Some("4"), "Four", false), (Some("5"), "Five", true)],
            false,
        );
        assert_eq!(f.text().as_deref(), Some("5"));

        let f = select(
            &[(Some("4"), "Four", false), (Some("5"), "Five", false)],
            false,
        );
        assert_eq!(f.text().as_deref(), Some("4"));

        let f = select(&[], false);
        assert_eq!(f.value(), None);
    }

    #[test]
    fn test_option_without_value_uses_text() {
        let f = select(&[(None, "Apple", false), (None, "Pear", false)], false);
        assert_eq!(f.text().as_deref(), Some("Apple"));
    }

    #[test]
    fn test_option_with_empty_value_does_not_use_text() {
        let mut f = select(
            &[(Some(""), "Choose...", false), (None, "Pear", false)],
            false,
        );
        assert_eq!(f.text().as_deref(), Some(""));
        f.set("Pear").unwrap();
        assert_eq!(f.text().as_deref(), Some("Pear"));
        assert!(f.set("Choose...").is_err());
    }

    #[test]
    fn test_select_set_validates() {
        let mut f = select(
            &[(Some("4"), "Four", false), (Some("5"), "Five", true)],
            false,
        );
        f.set(4_u32).unwrap();
        assert_eq!(f.text().as_deref(), Some("4"));
        let err = f.set("984").unwrap_err();
        match err {
            WebProbeError::OptionNotFound { value, options } => {
                assert!(value.contains("984"));
                assert!(options.contains("\"4\""));
                assert!(options.contains("\"5\""));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(f.text().as_deref(), Some("4"));
    }

    #[test]
    fn test_force_then_set_clears_forced() {
        let mut f = select(
            &[(Some("4"), "Four", false), (Some("5"), "Five", true)],
            false,
        );
        assert!(f.set("984").is_err());
        f.force_value("984").unwrap();
        assert_eq!(f.text().as_deref(), Some("984"));
        f.set("4").unwrap();
        assert_eq!(f.text().as_deref(), Some("4"));
        assert!(matches!(
            f.kind(),
            FieldKind::Select(Choice {
                selection: Selection::Validated(0),
                ..
            })
        ));
    }

    #[test]
    fn test_radio_has_no_default_without_checked() {
        let mut f = field("input", &[("type", "radio")]);
        f.push_option(SelectOption::new(Some("bar".into()), "on", false));
        f.push_option(SelectOption::new(Some("baz".into()), "on", false));
        assert_eq!(f.value(), None);
        f.set("baz").unwrap();
        assert_eq!(f.text().as_deref(), Some("baz"));
    }

    #[test]
    fn test_multiple_select() {
        let mut f = select(
            &[
                (Some("8"), "Eight", true),
                (Some("9"), "Nine", false),
                (Some("10"), "Ten", false),
                (Some("11"), "Eleven", true),
            ],
            true,
        );
        assert_eq!(f.value(), Some(Value::from(vec!["8", "11"])));
        f.set(vec!["9"]).unwrap();
        assert_eq!(f.value(), Some(Value::from(vec!["9"])));

        let err = f.set(vec!["9", "12", "13"]).unwrap_err();
        assert!(err.to_string().contains("12, 13"));
        assert_eq!(f.value(), Some(Value::from(vec!["9"])));
    }

    #[test]
    fn test_multiple_select_without_selection_is_none() {
        let mut f = select(
            &[(Some("8"), "Eight", false), (Some("9"), "Nine", false)],
            true,
        );
        assert_eq!(f.value(), None);
        f.set(Vec::<String>::new()).unwrap();
        assert_eq!(f.value(), None);
    }

    #[test]
    fn test_multiple_select_duplicate_request_needs_duplicate_options() {
        let mut f = select(&[(Some("a"), "A", false), (Some("b"), "B", false)], true);
        assert!(f.set(vec!["a", "a"]).is_err());

        let mut f = select(&[(Some("a"), "A", false), (Some("a"), "A", false)], true);
        f.set(vec!["a", "a"]).unwrap();
        assert_eq!(f.value(), Some(Value::from(vec!["a", "a"])));
    }

    #[test]
    fn test_multiple_select_forced() {
        let mut f = select(&[(Some("8"), "Eight", true)], true);
        f.force_value(vec!["99"]).unwrap();
        assert_eq!(f.value(), Some(Value::from(vec!["99"])));
        f.set(vec!["8"]).unwrap();
        assert_eq!(f.value(), Some(Value::from(vec!["8"])));
    }

    #[test]
    fn test_submit_is_immutable() {
        let mut f = Field::new(
            "input",
            Some("submit".into()),
            0,
            attrs(&[("type", "submit")]),
        );
        let err = f.set("x").unwrap_err();
        assert!(matches!(err, WebProbeError::ImmutableField { .. }));
        assert_eq!(f.value(), None);
        assert_eq!(f.value_if_submitted(), Some(""));
    }

    #[test]
    fn test_file_field() {
        let mut f = field("input", &[("type", "file")]);
        assert_eq!(f.value(), None);
        f.set(Upload::with_content("a.txt", "abc")).unwrap();
        assert!(matches!(f.value(), Some(Value::Upload(_))));
        let err = f.set(true).unwrap_err();
        assert!(matches!(err, WebProbeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_display() {
        let f = field("select", &[("id", "single")]);
        assert_eq!(f.to_string(), r#"<Select name="f" id="single">"#);
    }
}
