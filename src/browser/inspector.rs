use anyhow::{anyhow, Result};

use super::driver::PageDriver;
use crate::models::FieldDescriptor;

/// In-page extraction of form controls.
///
/// Radio buttons and checkboxes sharing a name are grouped into a single
/// descriptor carrying the group's options; native select options are captured
/// inline; combobox-like widgets are flagged `dropdown_like` (phone inputs are
/// never flagged, whatever their markup suggests).
pub const EXTRACT_FIELDS_SCRIPT: &str = r##"
(() => {
    const fields = [];
    const inputs = document.querySelectorAll('input, select, textarea, [role="combobox"], [role="listbox"]');

    const radioGroups = new Map();
    const checkboxGroups = new Map();

    const KNOWN_KINDS = ['text', 'email', 'tel', 'number', 'url', 'textarea', 'select', 'radio', 'checkbox', 'file'];

    const normalizeKind = (element) => {
        if (element.tagName === 'SELECT') return 'select';
        if (element.tagName === 'TEXTAREA') return 'textarea';
        const t = (element.type || 'text').toLowerCase();
        return KNOWN_KINDS.includes(t) ? t : 'text';
    };

    inputs.forEach((element, index) => {
        if (element.type === 'hidden') return;

        // Unique selector; IDs with leading digits or special characters need
        // the attribute form.
        let selector = '';
        if (element.id) {
            const id = element.id;
            if (/^[0-9]/.test(id) || /[!"#$%&'()*+,.\/:;<=>?@[\\\]^`{|}~]/.test(id)) {
                selector = `[id="${id}"]`;
            } else {
                selector = `#${id}`;
            }
        } else if (element.name) {
            selector = `[name="${element.name}"]`;
        } else {
            selector = `${element.tagName.toLowerCase()}:nth-of-type(${index + 1})`;
        }

        // Label: for-attribute, enclosing label, then common field containers
        let label = '';
        if (element.id) {
            const labelEl = document.querySelector(`label[for="${element.id}"]`);
            if (labelEl) label = labelEl.textContent?.trim() || '';
        }
        if (!label) {
            const parentLabel = element.closest('label');
            if (parentLabel) label = parentLabel.textContent?.trim() || '';
        }
        if (!label) {
            const container = element.closest('.application-question, .form-field, .field-container');
            if (container) {
                const labelEl = container.querySelector('.application-label, .field-label, label, .text');
                if (labelEl) label = labelEl.textContent?.trim() || '';
            }
        }

        const name = element.name || element.id || '';
        const kind = normalizeKind(element);
        const required = element.required || element.getAttribute('aria-required') === 'true';
        const placeholder = element.placeholder || '';
        const dataQa = element.getAttribute('data-qa') || '';

        if (kind === 'radio') {
            const group = radioGroups.get(name) || [];
            group.push({
                value: element.value,
                label: label || element.nextSibling?.textContent?.trim() || element.value,
                checked: element.checked
            });
            radioGroups.set(name, group);
            return;
        }

        if (kind === 'checkbox') {
            const container = element.closest('[data-qa*="Checkboxes"], .checkbox-group, .multiple-select');
            if (container || (name && name !== 'consent[marketing]')) {
                const groupName = name || container?.getAttribute('data-qa') || 'checkbox-group';
                const group = checkboxGroups.get(groupName) || [];
                group.push({
                    value: element.value,
                    label: label || element.nextSibling?.textContent?.trim() || element.value,
                    checked: element.checked
                });
                checkboxGroups.set(groupName, group);
                return;
            }
        }

        let options = [];
        if (element.tagName === 'SELECT') {
            options = Array.from(element.options).map(opt => ({
                value: opt.value,
                label: opt.text,
                checked: opt.selected
            }));
        }

        // Combobox-like widgets need the dropdown interaction ladder; phone
        // inputs never do, whatever their markup suggests.
        const isPhoneField = kind === 'tel' || /phone|telephone|mobile/i.test(name + ' ' + label);
        const dropdownLike = !isPhoneField && (
            kind === 'select' ||
            /country|location|state|city|company|university|school|ireland|county|sponsorship|visa|authorization|eligibility|yes|no/i.test(name + ' ' + label) ||
            element.getAttribute('role') === 'combobox' ||
            element.getAttribute('aria-haspopup') === 'listbox' ||
            element.closest('[role="combobox"]') !== null);

        fields.push({
            selector,
            name,
            kind,
            label: label || placeholder || name || '',
            required,
            placeholder,
            data_qa: dataQa,
            options,
            dropdown_like: dropdownLike
        });
    });

    radioGroups.forEach((options, name) => {
        fields.push({
            selector: `[name="${name}"]`,
            name,
            kind: 'radio-group',
            options,
            required: document.querySelector(`input[name="${name}"][required]`) !== null,
            label: options[0]?.label?.replace(options[0]?.value, '')?.trim() || name,
            placeholder: '',
            data_qa: '',
            dropdown_like: false
        });
    });

    checkboxGroups.forEach((options, name) => {
        const isRequired = document.querySelector(`input[name="${name}"][required]`) !== null ||
            document.querySelector(`fieldset[id="${name}"][aria-required="true"]`) !== null ||
            document.querySelector(`fieldset:has(input[name="${name}"][required])`) !== null;

        let groupLabel = name;
        const fieldset = document.querySelector(`fieldset:has(input[name="${name}"])`);
        if (fieldset) {
            const legend = fieldset.querySelector('legend');
            if (legend) groupLabel = legend.textContent?.trim() || name;
        }

        fields.push({
            selector: `[name="${name}"]`,
            name,
            kind: 'checkbox-group',
            options,
            required: isRequired,
            label: groupLabel,
            placeholder: '',
            data_qa: '',
            dropdown_like: false
        });
    });

    return fields;
})()
"##;

/// Extract an ordered list of field descriptors from the loaded page.
pub async fn inspect_form(driver: &dyn PageDriver) -> Result<Vec<FieldDescriptor>> {
    let value = driver.evaluate(EXTRACT_FIELDS_SCRIPT).await?;
    let fields: Vec<FieldDescriptor> = serde_json::from_value(value)
        .map_err(|e| anyhow!("Failed to parse extracted fields: {}", e))?;

    let dropdown_like = fields.iter().filter(|f| f.dropdown_like).count();
    tracing::info!(
        "Found {} form fields ({} dropdown-like, {} required)",
        fields.len(),
        dropdown_like,
        fields.iter().filter(|f| f.required).count()
    );
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldKind, InferredPurpose};

    #[test]
    fn test_extracted_json_parses_into_descriptors() {
        let raw = serde_json::json!([
            {
                "selector": "#first_name",
                "name": "first_name",
                "kind": "text",
                "label": "First Name",
                "required": true,
                "placeholder": "",
                "data_qa": "",
                "options": [],
                "dropdown_like": false
            },
            {
                "selector": "[name=\"eeo[gender]\"]",
                "name": "eeo[gender]",
                "kind": "checkbox-group",
                "label": "Gender",
                "required": false,
                "placeholder": "",
                "data_qa": "",
                "options": [
                    {"value": "male", "label": "Male", "checked": false},
                    {"value": "female", "label": "Female", "checked": false}
                ],
                "dropdown_like": false
            }
        ]);

        let fields: Vec<FieldDescriptor> = serde_json::from_value(raw).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].kind, FieldKind::Text);
        assert_eq!(fields[0].purpose, InferredPurpose::Unmapped);
        assert_eq!(fields[1].kind, FieldKind::CheckboxGroup);
        assert_eq!(fields[1].options.len(), 2);
        assert_eq!(fields[1].options[0].display(), "Male");
    }
}
