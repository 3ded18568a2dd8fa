use crate::domain::model::{CategoryLines, Document, Scalar, ServiceBlock};
use crate::utils::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const ROOT_ELEMENT: &str = "billingDocument";
const BENEFICIARIES_ELEMENT: &str = "beneficiaries";
const BENEFICIARY_ELEMENT: &str = "beneficiary";
const SERVICES_ELEMENT: &str = "services";
const LINE_ELEMENT: &str = "line";

/// Render the whole document as an indented XML dump. Field and category
/// names become element names; null values become empty elements.
pub fn document_to_xml(document: &Document) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;

    for (name, value) in &document.meta {
        write_text_element(&mut writer, name, &value_text(value))?;
    }

    writer.write_event(Event::Start(BytesStart::new(BENEFICIARIES_ELEMENT)))?;
    for entry in &document.beneficiaries {
        writer.write_event(Event::Start(BytesStart::new(BENEFICIARY_ELEMENT)))?;

        if let Some(type_code) = &entry.document_type_code {
            write_text_element(&mut writer, "documentTypeCode", &type_code.to_string())?;
        }
        if let Some(number) = &entry.document_number {
            write_text_element(&mut writer, "documentNumber", &number.to_string())?;
        }
        for (name, value) in &entry.extra {
            write_text_element(&mut writer, name, &value_text(value))?;
        }

        if let Some(block) = &entry.services {
            writer.write_event(Event::Start(BytesStart::new(SERVICES_ELEMENT)))?;
            match block {
                ServiceBlock::Categories(categories) => {
                    for (category, lines) in categories {
                        writer.write_event(Event::Start(BytesStart::new(category.as_str())))?;
                        match lines {
                            CategoryLines::Lines(lines) => {
                                for line in lines {
                                    writer
                                        .write_event(Event::Start(BytesStart::new(LINE_ELEMENT)))?;
                                    for (field, value) in line {
                                        write_text_element(
                                            &mut writer,
                                            field,
                                            &scalar_text(value),
                                        )?;
                                    }
                                    writer.write_event(Event::End(BytesEnd::new(LINE_ELEMENT)))?;
                                }
                            }
                            CategoryLines::Other(value) => {
                                writer.write_event(Event::Text(BytesText::new(&value_text(
                                    value,
                                ))))?;
                            }
                        }
                        writer.write_event(Event::End(BytesEnd::new(category.as_str())))?;
                    }
                }
                ServiceBlock::Other(value) => {
                    writer.write_event(Event::Text(BytesText::new(&value_text(value))))?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new(SERVICES_ELEMENT)))?;
        }

        writer.write_event(Event::End(BytesEnd::new(BENEFICIARY_ELEMENT)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(BENEFICIARIES_ELEMENT)))?;

    writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    Ok(writer.into_inner())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn scalar_text(value: &Scalar) -> String {
    value.to_string()
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
