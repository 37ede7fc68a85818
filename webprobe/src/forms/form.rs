//! A single `<form>` and its controls

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Match, Regex};

use super::field::{Field, FieldKind, SelectOption, Value};
use super::upload::{Upload, UploadField};
use crate::app::{Origin, Params};
use crate::error::{Result, WebProbeError};
use crate::html::{parse_attrs, unescape_html, TAG_RE};
use crate::response::TestResponse;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<label\s+(?:[^>]*)for=(?:"|')([a-z0-9_\-]+)(?:"|')(?:[^>]*)>"#)
        .expect("label regex is valid")
});

const DEFAULT_ENCTYPE: &str = "application/x-www-form-urlencoded";

/// A value in the submission pair list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitValue {
    /// Plain value
    Text(String),
    /// File part, multipart-encoded by the transport layer
    File(Upload),
}

impl SubmitValue {
    /// The text, if this is not a file
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }
}

impl From<&str> for SubmitValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SubmitValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Upload> for SubmitValue {
    fn from(upload: Upload) -> Self {
        Self::File(upload)
    }
}

/// What submitting a form would send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Target URI, relative to the page the form came from
    pub action: String,
    /// Upper-cased method
    pub method: String,
    /// Ordered name/value pairs
    pub fields: Vec<(String, SubmitValue)>,
    /// Body content type, `None` for GET
    pub content_type: Option<String>,
}

/// A form found in a page
///
/// Controls keep their document order, which is the order they are
/// submitted in. Field values are the only thing that changes after
/// parsing.
///
/// # Examples
///
/// ```rust
/// use webprobe::forms::Form;
///
/// let mut form = Form::parse(
///     r#"<form action="/save" method="post">
///          <input name="title" value="draft">
///          <input type="checkbox" name="publish">
///          <input type="submit" name="go" value="Save">
///        </form>"#,
/// )
/// .unwrap();
/// form.set("title", "final").unwrap();
/// form.set("publish", true).unwrap();
///
/// let fields = form.submit_fields(Some("go"), None);
/// let pairs: Vec<_> = fields
///     .iter()
///     .map(|(name, value)| (name.as_str(), value.as_text().unwrap()))
///     .collect();
/// assert_eq!(pairs, [("title", "final"), ("publish", "on"), ("go", "Save")]);
/// ```
#[derive(Clone)]
pub struct Form {
    text: String,
    action: String,
    method: String,
    id: Option<String>,
    enctype: String,
    fields: Vec<Field>,
    by_name: HashMap<String, Vec<usize>>,
    origin: Option<Origin>,
}

impl Form {
    /// Parse the text of one `<form>...</form>` block
    ///
    /// # Errors
    ///
    /// - [`WebProbeError::NoFormTag`] / [`WebProbeError::NoFormCloseTag`]
    ///   when the form tags are missing;
    /// - [`WebProbeError::Parse`] for nested selects or textareas, stray
    ///   closing tags, options outside a select, or a radio sharing its
    ///   name with an earlier non-radio control.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let tag = parse_form_tag(&text)?;
        let fields = parse_fields(&text)?;

        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            if let Some(name) = field.name() {
                by_name.entry(name.to_string()).or_default().push(i);
            }
        }

        Ok(Self {
            action: tag.get("action").cloned().unwrap_or_default(),
            method: tag
                .get("method")
                .map_or_else(|| "GET".to_string(), |m| m.to_uppercase()),
            id: tag.get("id").cloned(),
            enctype: tag
                .get("enctype")
                .cloned()
                .unwrap_or_else(|| DEFAULT_ENCTYPE.to_string()),
            text,
            fields,
            by_name,
            origin: None,
        })
    }

    pub(crate) fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Full HTML of the form
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `action` attribute, `""` when absent
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Upper-cased `method` attribute, `GET` when absent
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// `id` attribute
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// `enctype` attribute
    #[must_use]
    pub fn enctype(&self) -> &str {
        &self.enctype
    }

    /// Every control in document order
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Distinct control names in document order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.fields.iter().filter_map(Field::name) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn indices(&self, name: &str) -> Result<&[usize]> {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| WebProbeError::FieldNotFound {
                name: name.to_string(),
                available: self
                    .names()
                    .iter()
                    .map(|n| format!("{n:?}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    fn unique(&self, name: &str) -> Result<usize> {
        match self.indices(name)? {
            [index] => Ok(*index),
            many => Err(WebProbeError::AmbiguousField {
                name: name.to_string(),
                matches: many
                    .iter()
                    .map(|i| self.fields[*i].to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn position(&self, name: &str, index: Option<usize>) -> Result<usize> {
        let Some(index) = index else {
            return self.unique(name);
        };
        let indices = self.indices(name)?;
        indices
            .get(index)
            .copied()
            .ok_or(WebProbeError::IndexOutOfRange {
                matched: indices.len(),
                total: indices.len(),
                index,
            })
    }

    /// The only control called `name`
    ///
    /// # Errors
    ///
    /// [`WebProbeError::FieldNotFound`] or [`WebProbeError::AmbiguousField`].
    pub fn field(&self, name: &str) -> Result<&Field> {
        Ok(&self.fields[self.unique(name)?])
    }

    /// Mutable access to the only control called `name`
    ///
    /// # Errors
    ///
    /// See [`Form::field`].
    pub fn field_mut(&mut self, name: &str) -> Result<&mut Field> {
        let i = self.unique(name)?;
        Ok(&mut self.fields[i])
    }

    /// The `index`-th control called `name`, or the only one when `index`
    /// is `None`
    ///
    /// # Errors
    ///
    /// [`WebProbeError::FieldNotFound`], [`WebProbeError::AmbiguousField`]
    /// or [`WebProbeError::IndexOutOfRange`].
    pub fn get(&self, name: &str, index: Option<usize>) -> Result<&Field> {
        Ok(&self.fields[self.position(name, index)?])
    }

    /// Mutable version of [`Form::get`]
    ///
    /// # Errors
    ///
    /// See [`Form::get`].
    pub fn get_mut(&mut self, name: &str, index: Option<usize>) -> Result<&mut Field> {
        let i = self.position(name, index)?;
        Ok(&mut self.fields[i])
    }

    /// Like [`Form::get`] but `None` when no control has that name
    #[must_use]
    pub fn find(&self, name: &str, index: Option<usize>) -> Option<&Field> {
        if self.by_name.contains_key(name) {
            self.get(name, index).ok()
        } else {
            None
        }
    }

    /// Like [`Form::get`] but returns `default` when no control has that
    /// name
    ///
    /// # Errors
    ///
    /// Ambiguity and index errors still apply to names that exist.
    pub fn get_or<'a>(
        &'a self,
        name: &str,
        index: Option<usize>,
        default: &'a Field,
    ) -> Result<&'a Field> {
        if self.by_name.contains_key(name) {
            self.get(name, index)
        } else {
            Ok(default)
        }
    }

    /// Set the only control called `name`
    ///
    /// # Errors
    ///
    /// Lookup errors as for [`Form::field`], then [`Field::set`] errors.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.field_mut(name)?.set(value)
    }

    /// Set the `index`-th control called `name`
    ///
    /// # Errors
    ///
    /// Lookup errors as for [`Form::get`], then [`Field::set`] errors.
    pub fn set_at(&mut self, name: &str, index: usize, value: impl Into<Value>) -> Result<()> {
        self.get_mut(name, Some(index))?.set(value)
    }

    /// Like [`Form::set`] but the control must be a single-value `<select>`
    ///
    /// # Errors
    ///
    /// [`WebProbeError::NotASelect`] besides the [`Form::set`] errors.
    pub fn select(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.select_field(name, None, value.into())
    }

    /// Like [`Form::set_at`] but the control must be a single-value
    /// `<select>`
    ///
    /// # Errors
    ///
    /// [`WebProbeError::NotASelect`] besides the [`Form::set_at`] errors.
    pub fn select_at(&mut self, name: &str, index: usize, value: impl Into<Value>) -> Result<()> {
        self.select_field(name, Some(index), value.into())
    }

    fn select_field(&mut self, name: &str, index: Option<usize>, value: Value) -> Result<()> {
        let field = self.get_mut(name, index)?;
        if !matches!(field.kind(), FieldKind::Select(_)) {
            return Err(WebProbeError::NotASelect(name.to_string()));
        }
        field.set(value)
    }

    /// The pair list a browser would send
    ///
    /// `pressed` names the submit control that was clicked and `index`
    /// picks among submit controls sharing that name (default 0). Other
    /// submit controls contribute nothing.
    #[must_use]
    pub fn submit_fields(
        &self,
        pressed: Option<&str>,
        index: Option<usize>,
    ) -> Vec<(String, SubmitValue)> {
        let index = index.unwrap_or(0);
        let mut seen = 0;
        let mut pressed_found = false;
        let mut pairs = Vec::new();

        for field in &self.fields {
            let Some(name) = field.name() else {
                continue;
            };
            if let Some(submitted) = field.value_if_submitted() {
                if pressed == Some(name) {
                    if seen == index {
                        pairs.push((name.to_string(), SubmitValue::from(submitted)));
                        pressed_found = true;
                    }
                    seen += 1;
                }
                continue;
            }
            match field.value() {
                None | Some(Value::Checked(_)) => {}
                Some(Value::Text(text)) => pairs.push((name.to_string(), SubmitValue::Text(text))),
                Some(Value::List(items)) => pairs.extend(
                    items
                        .into_iter()
                        .map(|item| (name.to_string(), SubmitValue::Text(item))),
                ),
                Some(Value::Upload(upload)) => {
                    pairs.push((name.to_string(), SubmitValue::File(upload)));
                }
            }
        }

        if let Some(pressed) = pressed.filter(|_| !pressed_found) {
            tracing::warn!(
                button = pressed,
                index,
                candidates = seen,
                "pressed submit control not found in form"
            );
        }
        pairs
    }

    /// File controls currently holding an upload
    #[must_use]
    pub fn upload_fields(&self) -> Vec<UploadField> {
        self.fields
            .iter()
            .filter_map(|field| match (field.name(), field.value()) {
                (Some(name), Some(Value::Upload(upload))) => Some(UploadField::new(name, upload)),
                _ => None,
            })
            .collect()
    }

    /// Check that every visible control has an `id` with a matching
    /// `<label for=...>`
    ///
    /// # Errors
    ///
    /// [`WebProbeError::Lint`] naming the first offending control.
    pub fn lint(&self) -> Result<()> {
        let labels: Vec<&str> = LABEL_RE
            .captures_iter(&self.text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        for field in &self.fields {
            if field.is_submit() || field.is_hidden() {
                continue;
            }
            match field.id() {
                None => return Err(WebProbeError::Lint(format!("{field} has no id attribute"))),
                Some(id) if !labels.contains(&id) => {
                    return Err(WebProbeError::Lint(format!(
                        "{field} has no associated label"
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Describe the request submitting the form would make
    #[must_use]
    pub fn submission(&self, pressed: Option<&str>, index: Option<usize>) -> Submission {
        let content_type = (self.method != "GET").then(|| self.enctype.clone());
        Submission {
            action: self.action.clone(),
            method: self.method.clone(),
            fields: self.submit_fields(pressed, index),
            content_type,
        }
    }

    /// Submit the form through the application it came from
    ///
    /// # Errors
    ///
    /// [`WebProbeError::Detached`] for forms parsed from bare text, then
    /// any dispatch or status error.
    pub async fn submit(
        &self,
        pressed: Option<&str>,
        index: Option<usize>,
    ) -> Result<TestResponse> {
        let origin = self.origin.as_ref().ok_or(WebProbeError::Detached)?;
        let submission = self.submission(pressed, index);
        tracing::debug!(
            action = %submission.action,
            method = %submission.method,
            fields = submission.fields.len(),
            "submitting form"
        );
        origin
            .goto(
                &submission.action,
                &submission.method,
                Some(Params::Pairs(submission.fields)),
                submission.content_type,
            )
            .await
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("action", &self.action)
            .field("method", &self.method)
            .field("id", &self.id)
            .field("enctype", &self.enctype)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Form")?;
        if let Some(id) = &self.id {
            write!(f, " id={id:?}")?;
        }
        f.write_str(" />")
    }
}

/// Attributes of the first `<form>` tag before `</form>`
fn parse_form_tag(text: &str) -> Result<HashMap<String, String>> {
    let mut attrs = None;
    for caps in TAG_RE.captures_iter(text) {
        if !caps[2].eq_ignore_ascii_case("form") {
            continue;
        }
        if &caps[1] == "/" {
            return attrs.ok_or(WebProbeError::NoFormTag);
        }
        attrs = Some(parse_attrs(&caps[3]));
    }
    Err(WebProbeError::NoFormCloseTag)
}

fn parse_fields(text: &str) -> Result<Vec<Field>> {
    let mut scanner = FieldScanner::default();
    for caps in TAG_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let tag = caps[2].to_lowercase();
        if !matches!(
            tag.as_str(),
            "input" | "select" | "option" | "textarea" | "button"
        ) {
            continue;
        }

        if &caps[1] == "/" {
            scanner.close(text, &tag, &whole)?;
            continue;
        }
        let mut attrs = parse_attrs(&caps[3]);
        let name = attrs.remove("name");
        let is_radio = tag == "input"
            && attrs
                .get("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("radio"));
        if tag == "option" {
            let rest = &text[whole.end()..];
            let label = unescape_html(&rest[..rest.find('<').unwrap_or(rest.len())]);
            scanner.option(&whole, &attrs, label.trim())?;
        } else if is_radio {
            scanner.radio(name, whole.start(), attrs)?;
        } else {
            scanner.open(&tag, name, &whole, attrs)?;
        }
    }
    Ok(scanner.fields)
}

/// Parse state while walking the tags of one form
#[derive(Default)]
struct FieldScanner {
    fields: Vec<Field>,
    /// Radio group name to the field holding the group
    radios: HashMap<String, usize>,
    /// First field index per name, radios excluded
    names: HashMap<String, usize>,
    in_select: Option<usize>,
    /// Textarea field index and the offset its content starts at
    in_textarea: Option<(usize, usize)>,
}

impl FieldScanner {
    fn close(&mut self, text: &str, tag: &str, whole: &Match<'_>) -> Result<()> {
        match tag {
            "select" => {
                if self.in_select.take().is_none() {
                    return Err(WebProbeError::Parse(format!(
                        "{} without starting select",
                        whole.as_str()
                    )));
                }
            }
            "textarea" => {
                let (i, start) = self.in_textarea.take().ok_or_else(|| {
                    WebProbeError::Parse(format!(
                        "</textarea> with no <textarea> at {}",
                        whole.start()
                    ))
                })?;
                self.fields[i].set(unescape_html(&text[start..whole.start()]))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn option(
        &mut self,
        whole: &Match<'_>,
        attrs: &HashMap<String, String>,
        label: &str,
    ) -> Result<()> {
        let i = self.in_select.ok_or_else(|| {
            WebProbeError::Parse(format!("{} outside of a <select>", whole.as_str()))
        })?;
        self.fields[i].push_option(SelectOption::new(
            attrs.get("value").cloned(),
            label,
            attrs.contains_key("selected"),
        ));
        Ok(())
    }

    fn radio(
        &mut self,
        name: Option<String>,
        pos: usize,
        attrs: HashMap<String, String>,
    ) -> Result<()> {
        let option = SelectOption::new(
            attrs.get("value").cloned(),
            "on",
            attrs.contains_key("checked"),
        );
        if let Some(name) = &name {
            if let Some(&i) = self.radios.get(name) {
                self.fields[i].push_option(option);
                return Ok(());
            }
            if self.names.contains_key(name) {
                return Err(WebProbeError::Parse(format!(
                    "radio {name:?} shares its name with an earlier non-radio control"
                )));
            }
            self.radios.insert(name.clone(), self.fields.len());
        }
        let mut field = Field::new("input", name, pos, attrs);
        field.push_option(option);
        self.fields.push(field);
        Ok(())
    }

    fn open(
        &mut self,
        tag: &str,
        name: Option<String>,
        whole: &Match<'_>,
        attrs: HashMap<String, String>,
    ) -> Result<()> {
        match tag {
            "textarea" => {
                if self.in_textarea.is_some() {
                    return Err(WebProbeError::Parse(format!(
                        "Nested textareas at {}",
                        whole.start()
                    )));
                }
                self.in_textarea = Some((self.fields.len(), whole.end()));
            }
            "select" => {
                if self.in_select.is_some() {
                    return Err(WebProbeError::Parse(format!(
                        "Nested selects at {}",
                        whole.start()
                    )));
                }
                self.in_select = Some(self.fields.len());
            }
            _ => {}
        }
        if let Some(name) = &name {
            self.names.entry(name.clone()).or_insert(self.fields.len());
        }
        self.fields.push(Field::new(tag, name, whole.start(), attrs));
        Ok(())
    }
}
