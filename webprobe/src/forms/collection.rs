//! All forms of a page

use std::collections::HashMap;

use super::form::Form;
use crate::error::{Result, WebProbeError};

/// Key for looking up a form: position or `id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKey {
    /// 0-based position in the page
    Index(usize),
    /// `id` attribute
    Id(String),
}

impl From<usize> for FormKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for FormKey {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for FormKey {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// Forms of a page, by position and by id
#[derive(Debug, Clone, Default)]
pub struct Forms {
    forms: Vec<Form>,
    by_id: HashMap<String, usize>,
}

impl Forms {
    /// Index a list of forms in page order
    #[must_use]
    pub fn new(forms: Vec<Form>) -> Self {
        let mut by_id = HashMap::new();
        for (i, form) in forms.iter().enumerate() {
            if let Some(id) = form.id() {
                by_id.entry(id.to_string()).or_insert(i);
            }
        }
        Self { forms, by_id }
    }

    fn position(&self, key: &FormKey) -> Result<usize> {
        let found = match key {
            FormKey::Index(i) => (*i < self.forms.len()).then_some(*i),
            FormKey::Id(id) => self.by_id.get(id).copied(),
        };
        found.ok_or_else(|| {
            let key = match key {
                FormKey::Index(i) => i.to_string(),
                FormKey::Id(id) => format!("{id:?}"),
            };
            let ids: Vec<String> = self.by_id.keys().map(|id| format!("{id:?}")).collect();
            WebProbeError::FormNotFound(
                key,
                format!("{} in total, ids [{}]", self.forms.len(), ids.join(", ")),
            )
        })
    }

    /// Form by position or id
    ///
    /// # Errors
    ///
    /// [`WebProbeError::FormNotFound`].
    pub fn get(&self, key: impl Into<FormKey>) -> Result<&Form> {
        let i = self.position(&key.into())?;
        Ok(&self.forms[i])
    }

    /// Mutable form by position or id
    ///
    /// # Errors
    ///
    /// [`WebProbeError::FormNotFound`].
    pub fn get_mut(&mut self, key: impl Into<FormKey>) -> Result<&mut Form> {
        let i = self.position(&key.into())?;
        Ok(&mut self.forms[i])
    }

    /// The only form
    ///
    /// # Errors
    ///
    /// [`WebProbeError::NoForms`] or [`WebProbeError::MultipleForms`].
    pub fn single(&self) -> Result<&Form> {
        match self.forms.as_slice() {
            [form] => Ok(form),
            [] => Err(WebProbeError::NoForms),
            many => Err(WebProbeError::MultipleForms(many.len())),
        }
    }

    /// Mutable version of [`Forms::single`]
    ///
    /// # Errors
    ///
    /// See [`Forms::single`].
    pub fn single_mut(&mut self) -> Result<&mut Form> {
        match self.forms.as_mut_slice() {
            [form] => Ok(form),
            [] => Err(WebProbeError::NoForms),
            many => Err(WebProbeError::MultipleForms(many.len())),
        }
    }

    /// Number of forms
    #[must_use]
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Whether the page has no forms
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Forms in page order
    pub fn iter(&self) -> std::slice::Iter<'_, Form> {
        self.forms.iter()
    }
}

impl<'a> IntoIterator for &'a Forms {
    type Item = &'a Form;
    type IntoIter = std::slice::Iter<'a, Form>;

    fn into_iter(self) -> Self::IntoIter {
        self.forms.iter()
    }
}
