use crate::models::enums::DocumentType;

/// Build the analysis prompt, tailored to the document type.
pub fn build_analysis_prompt(text: &str, document_type: &str) -> String {
    let focus = match document_type {
        t if t == DocumentType::Receipt.as_str() => {
            "- Store name\n\
             - Date and time\n\
             - Items purchased\n\
             - Subtotal, tax, and total amounts\n\
             - Payment method\n\
             - Receipt number"
        }
        t if t == DocumentType::Form.as_str() => {
            "- Form title/type\n\
             - All field names and values\n\
             - Dates\n\
             - Signatures (if mentioned)"
        }
        _ => {
            "- Main topic/subject\n\
             - Key points\n\
             - Important dates\n\
             - Named entities (people, organizations, locations)\n\
             - Any action items or deadlines"
        }
    };

    format!(
        "Analyze the following {document_type} and extract structured information.\n\n\
         Document text:\n{text}\n\n\
         Extract:\n{focus}\n\n\
         Format as JSON."
    )
}

/// Ask for the seven entity categories as one JSON object.
pub fn build_entities_prompt(text: &str) -> String {
    format!(
        r#"Extract the following entities from this text:
- Names (people, organizations)
- Dates (any date mentioned)
- Amounts (monetary values)
- Addresses (physical addresses)
- Phone numbers
- Email addresses
- Other important information

Text:
{text}

Provide the result as a structured JSON with these keys:
{{
  "names": [],
  "dates": [],
  "amounts": [],
  "addresses": [],
  "phone_numbers": [],
  "emails": [],
  "other": []
}}"#
    )
}

pub fn build_summary_prompt(text: &str) -> String {
    format!("Provide a concise summary (2-3 sentences) of the following document:\n\n{text}")
}

pub fn build_classification_prompt(text: &str) -> String {
    format!(
        r#"Analyze this document and provide:
1. Document type (receipt, invoice, form, letter, contract, note, other)
2. Key information extracted in a structured format
3. Confidence level (high, medium, low)

Document text:
{text}

Respond in JSON format:
{{
  "document_type": "",
  "confidence": "",
  "key_info": {{}},
  "suggestions": []
}}"#
    )
}
