// All LLM prompt constants for the resume pipeline.

/// System prompt for the extraction step.
/// Append `ADDITIONAL_INFORMATION_PREFIX` + the user's hints when present.
pub const EXTRACTION_SYSTEM: &str = "\
You are a document analyzer. Your task is to extract the important data for a resume based on the specified format.
You will be given messy user info copied from a website and need to extract the data according to the format.

Extract and organize the following information in a structured way:
- name: The person's full name
- age: The person's age (as a number)
- location: Where the person is located
- email: Contact email address
- phone: Contact phone number
- links: List of relevant links (LinkedIn, GitHub, portfolio, etc.)
- interests: List each interest with a brief description
- work_experience: For each position include company, position, start_date, end_date, and description
- education: For each entry include school, degree, field_of_study, and graduation_year
- certifications: For each certification include name, organization, and date_earned
- resume_style_notes: Notes about the desired style, industry focus, or special formatting

Do NOT use curly braces or JSON in your response.
Instead, use a clear structured format: one field per line, the field name followed by a colon and its value.
For lists, put the field name alone on its line, then one numbered item per line.
Write each structured item as comma-separated pairs on one line, for example:
1. company: Acme, position: Engineer, start_date: 2020-01, end_date: Present, description: Built the billing system
Leave out any field you cannot find.";

pub const ADDITIONAL_INFORMATION_PREFIX: &str = "ADDITIONAL INFORMATION: ";

/// Human message for the extraction step. Replace `{raw_text}` before sending.
pub const EXTRACTION_USER_TEMPLATE: &str = "USER INFO: {raw_text}";

/// HTML generation prompt, sent as a single user message.
/// Replace `{structured_info}` with the record as JSON.
pub const HTML_PROMPT_TEMPLATE: &str = "\
You are a resume builder. Create an HTML resume based on the provided structured information.
The resume should be well-formatted and ready to be converted to PDF.
Include appropriate styling using inline CSS.
Tailor the resume to the person's industry based on their resume_style_notes.
Output only the HTML code.

STRUCTURED INFO: {structured_info}";

/// Sampling temperatures for the two model calls.
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;
pub const HTML_TEMPERATURE: f32 = 0.2;
