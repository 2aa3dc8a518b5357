//! Prompt builders for the three tasks.
//!
//! Pure functions from task inputs to prompt text. Tasks 1 and 2 use a bare
//! user prompt; the task-3 teacher and student both get a role-setting
//! system prompt alongside the user prompt.

/// System role for the task-3 teacher.
const TEACHER_SYSTEM: &str = "你是一名国际汉语教师。";

/// System role for task-3 students.
const STUDENT_SYSTEM: &str = "你是一名正在学习汉语知识的学生。";

/// Single-choice question within a named subject field.
pub fn build_task1_prompt(question: &str, field: &str) -> String {
    format!("以下是关于{field}的单项选择题，请选出正确答案并将选项填写到\\boxed{{}}中。\n\n{question}")
}

/// Reading comprehension: material first, then the question.
pub fn build_task2_prompt(question: &str, material: &str) -> String {
    format!(
        "阅读以下材料并回答问题，选出唯一正确答案并将选项填写到\\boxed{{}}中。\n\n\
         # 材料：\n{material}\n\n\
         # 问题：\n{question}"
    )
}

/// Teacher prompt: distill knowledge from material under a teaching
/// guideline, answering in `{"knowledge": ...}` form.
pub fn build_teacher_prompt(guideline: &str, material: &str) -> (String, String) {
    let prompt = format!(
        "阅读以下材料，依据材料结合教学提示向学生传授相关知识，以{{\"knowledge\": 知识内容}}的格式输出。\n\n\
         # 材料：\n{material}\n\n\
         # 教学提示：\n{guideline}"
    );
    (TEACHER_SYSTEM.to_string(), prompt)
}

/// Student prompt guided by the teacher's knowledge.
pub fn build_guided_student_prompt(
    question: &str,
    material: &str,
    knowledge: &str,
) -> (String, String) {
    let prompt = format!(
        "阅读以下材料，结合教师传授的知识回答问题，选出唯一正确答案并将选项填写到\\boxed{{}}中。\n\n\
         # 材料：\n{material}\n\n\
         # 教师传授的知识：\n{knowledge}\n\n\
         # 问题：\n{question}"
    );
    (STUDENT_SYSTEM.to_string(), prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task1_prompt_embeds_field_and_question() {
        let prompt = build_task1_prompt("下列哪项正确？", "语言学");
        assert!(prompt.contains("关于语言学的单项选择题"));
        assert!(prompt.contains("下列哪项正确？"));
        assert!(prompt.contains("\\boxed{}"));
    }

    #[test]
    fn test_task2_prompt_orders_material_before_question() {
        let prompt = build_task2_prompt("问题文本", "材料文本");
        let material_pos = prompt.find("材料文本").unwrap();
        let question_pos = prompt.find("问题文本").unwrap();
        assert!(material_pos < question_pos);
    }

    #[test]
    fn test_teacher_prompt_roles() {
        let (system, prompt) = build_teacher_prompt("讲解声调", "材料文本");
        assert_eq!(system, "你是一名国际汉语教师。");
        assert!(prompt.contains("{\"knowledge\": 知识内容}"));
        assert!(prompt.contains("讲解声调"));
    }

    #[test]
    fn test_guided_student_prompt_embeds_knowledge() {
        let (system, prompt) = build_guided_student_prompt("问题", "材料", "声调辨义");
        assert_eq!(system, "你是一名正在学习汉语知识的学生。");
        assert!(prompt.contains("# 教师传授的知识：\n声调辨义"));
        assert!(prompt.contains("\\boxed{}"));
    }
}
