use crate::models::{CaseContext, ConversationMessage, DiagnosisResult, Speaker};

pub const FEEDBACK_SYSTEM_PROMPT: &str = r#"
You are an expert medical education evaluator. You review a medical student's
diagnostic interview with a simulated patient and return structured,
constructive feedback.

RULES (ABSOLUTE, NO EXCEPTIONS):
1. Respond with ONE valid JSON object and nothing else.
2. Base every statement on the case data and the transcript provided.
3. Name concrete symptoms, questions, or examinations. Never be generic.
4. Respect every numeric range in the rubric.
"#;

const RUBRIC: &str = r#"## RUBRIC

1. correct_diagnosis (0-40): 40 exact, 30-39 minor terminology differences,
   20-29 right category, 10-19 related system, 0-9 wrong.
2. key_questions (0-20): onset, duration, severity, character, associated
   symptoms, past history, medications, allergies, red flags.
3. right_tests (0-20): appropriate physical examinations or tests requested.
4. time_efficiency (0-10): focused questioning scores high, repetition low.
5. ruled_out_differentials (0-10): evidence of considering alternatives.

## DECISION TREE
Root is the chief complaint (type "symptom", asked true). Children are the
topics the student explored; deeper nodes are tests requested and conditions
ruled out. Exactly one node of type "diagnosis", asked true only if the
diagnosis is correct. Node types: symptom, test, ruled_out, diagnosis.
Maximum 4 levels deep, 3-6 main branches.

## CLUES
6-10 clues drawn from the presenting symptoms, absent symptoms and exam
findings above. importance is critical, helpful or minor; asked is whether
the student raised it.

## INSIGHT
summary: 2-3 sentences specific to this interview.
strengths: EXACTLY 2-3 items, each citing a specific question or action.
improvements: EXACTLY 2-3 items, each naming a missed symptom, question or exam.
tip: one actionable recommendation tied to what was missed in this case.

## OUTPUT FORMAT
```json
{
  "score": 0,
  "breakdown": {
    "correct_diagnosis": 0,
    "key_questions": 0,
    "right_tests": 0,
    "time_efficiency": 0,
    "ruled_out_differentials": 0
  },
  "decision_tree": {"id": "root", "label": "", "type": "symptom", "asked": true, "children": []},
  "clues": [{"id": "clue1", "text": "", "importance": "critical", "asked": false}],
  "insight": {"summary": "", "strengths": [], "improvements": [], "tip": ""},
  "user_diagnosis": "",
  "correct_diagnosis": "",
  "result": "correct | partial | wrong"
}
```"#;

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- None specified".to_string();
    }
    items
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Case block embedded in the feedback prompt.
pub fn format_case(case: &CaseContext) -> String {
    let acceptable = if case.acceptable_diagnoses.is_empty() {
        "None specified".to_string()
    } else {
        case.acceptable_diagnoses.join(", ")
    };
    format!(
        "Case Title: {title}\n\
         Specialty: {specialty}\n\
         Difficulty: {difficulty}\n\
         \n\
         Case Description: {description}\n\
         \n\
         Expected Diagnosis: {expected}\n\
         Acceptable Diagnoses: {acceptable}\n\
         \n\
         PRESENTING SYMPTOMS:\n{presenting}\n\
         \n\
         ABSENT SYMPTOMS:\n{absent}\n\
         \n\
         EXAM FINDINGS:\n{exam}",
        title = case.title,
        specialty = case.specialty,
        difficulty = case.difficulty,
        description = case.description,
        expected = case.expected_diagnosis,
        presenting = bullet_list(case.presenting()),
        absent = bullet_list(case.absent()),
        exam = bullet_list(case.exam_findings()),
    )
}

/// Transcript as `Student:` / `Patient:` lines, in order.
pub fn format_transcript(conversation: &[ConversationMessage]) -> String {
    conversation
        .iter()
        .map(|m| {
            let role = match m.speaker {
                Speaker::Student => "Student",
                Speaker::Patient => "Patient",
            };
            format!("{role}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the rubric prompt for one submission.
pub fn build_feedback_prompt(
    case: &CaseContext,
    conversation: &[ConversationMessage],
    user_diagnosis: &str,
    result: DiagnosisResult,
) -> String {
    let transcript = if conversation.is_empty() {
        "(no messages exchanged)".to_string()
    } else {
        format_transcript(conversation)
    };
    format!(
        "<case>\n{case_block}\n</case>\n\n\
         <transcript>\n{transcript}\n</transcript>\n\n\
         Student's diagnosis: {user_diagnosis}\n\
         Diagnosis result: {result}\n\n\
         {RUBRIC}",
        case_block = format_case(case),
    )
}
