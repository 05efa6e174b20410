//! Fixed texts and fallback values used by the question builders.

pub const CONSENT_CHOICE: &str = "I consent to participate in this study";
pub const DECLINE_CHOICE: &str = "I do not consent to participate";
/// Choice id of [`DECLINE_CHOICE`] in the consent question.
pub const DECLINE_CHOICE_ID: &str = "2";

pub const AGREEMENT_SCALE: [&str; 7] = [
    "Strongly Disagree",
    "Disagree",
    "Somewhat Disagree",
    "Neither Agree nor Disagree",
    "Somewhat Agree",
    "Agree",
    "Strongly Agree",
];

pub const AGREEMENT_INSTRUCTION: &str =
    "Please indicate your level of agreement with each statement:";
pub const RATING_INSTRUCTION: &str = "Please rate each statement:";

pub const DEFAULT_NUMERIC_MIN: i64 = 1;
pub const DEFAULT_NUMERIC_MAX: i64 = 999;

/// Choices given to a multiple-choice demographic that arrives without options.
pub const DEFAULT_CHOICES: [&str; 2] = ["Option 1", "Option 2"];

pub const DEFAULT_MANIPULATION_CHECK: &str =
    "In your own words, briefly describe the task or material you were presented with earlier in this study.";

pub fn demographic_prompt(field: &str) -> String {
    match field.trim().to_lowercase().as_str() {
        "age" => "What is your age?".to_string(),
        "gender" => "What is your gender?".to_string(),
        "ethnicity" => "What is your ethnicity? (Select all that apply)".to_string(),
        "education" => "What is the highest level of education you have completed?".to_string(),
        "income" => "What is your annual household income?".to_string(),
        "location" => "Where do you currently live? (City, State/Country)".to_string(),
        "relationship status" => "What is your current relationship status?".to_string(),
        "employment" => "What is your current employment status?".to_string(),
        _ => format!("Please provide your {field}:"),
    }
}

pub const CONSENT_TEXT: &str = r#"<h3>Informed Consent</h3>
<p><strong>Study Title:</strong> Research Study</p>
<p><strong>Principal Investigator:</strong> [Name]</p>
<p><strong>Institution:</strong> [Institution Name]</p>

<h4>Purpose of the Study</h4>
<p>You are being invited to participate in a research study. The purpose of this study is to better understand [general study purpose].</p>

<h4>Study Procedures</h4>
<p>If you agree to participate, you will be asked to complete an online survey that will take approximately [X] minutes. The survey includes questions about [general description of measures].</p>

<h4>Risks and Benefits</h4>
<p>The risks associated with this study are minimal and no greater than those encountered in everyday life. There are no direct benefits to participating in this study, but your responses will contribute to our understanding of [research area].</p>

<h4>Confidentiality</h4>
<p>Your responses will be kept confidential. No identifying information will be collected, and all data will be stored securely. Only the research team will have access to the data.</p>

<h4>Voluntary Participation</h4>
<p>Your participation in this study is completely voluntary. You may skip any questions you do not wish to answer, and you may withdraw from the study at any time without penalty.</p>

<h4>Contact Information</h4>
<p>If you have questions about this study, please contact [PI name] at [email].</p>
<p>If you have questions about your rights as a research participant, please contact the Institutional Review Board at [IRB contact].</p>

<h4>Consent</h4>
<p>By clicking "I consent" below, you indicate that you have read and understood the information provided above, and that you voluntarily agree to participate in this research study.</p>"#;

pub const DEBRIEF_TEXT: &str = r#"<h3>Study Debriefing</h3>

<p>Thank you for participating in our study!</p>

<h4>Purpose of the Study</h4>
<p>The purpose of this study was to examine [specific research question]. We were particularly interested in understanding [key variables and relationships].</p>

<h4>Hypotheses</h4>
<p>We hypothesized that [main hypotheses]. Your responses will help us determine whether these predictions are supported.</p>

<h4>Importance</h4>
<p>This research is important because [significance of the research]. The findings may help us better understand [practical or theoretical implications].</p>

<h4>Confidentiality Reminder</h4>
<p>As a reminder, your responses are completely confidential and will only be reported in aggregate form.</p>

<h4>Further Information</h4>
<p>If you would like to learn more about this area of research, you may be interested in the following resources:</p>
<ul>
  <li>[Relevant article or book]</li>
  <li>[Relevant website or resource]</li>
</ul>

<h4>Contact Information</h4>
<p>If you have any questions or concerns about this study, please feel free to contact:</p>
<p>[PI Name] at [email]</p>

<h4>Thank You</h4>
<p>We greatly appreciate your participation in this research. Your contribution helps advance our understanding of [research area].</p>

<p><em>You may now close this window.</em></p>"#;
