/// Prompt for the spoken introduction. `{resume_text}` is replaced verbatim.
pub const INTRODUCTION_PROMPT: &str = "\
    Generate a brief professional introduction based on the following resume. \
    Highlight the key skills, include specific numbers and achievements from projects, \
    and mention the total years of experience: {resume_text}";
