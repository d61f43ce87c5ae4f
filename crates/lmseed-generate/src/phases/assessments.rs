use rand::seq::IndexedRandom;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use lmseed_core::EntityKind;
use lmseed_core::entities::{
    Assessment, AssessmentQuestion, AssessmentResult, Assignment, AssignmentSubmission, Course,
};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::faker::Faker;
use crate::phases::enrollment::enrollment_refs;
use crate::phases::group_by;
use crate::pipeline::Phase;
use crate::synth::{SAMPLE_PDF_URL, chance, coin, int, maybe, money, percentage, pick, pick_string, round2, uniform};

const QUESTION_TYPES: &[&str] = &["mcq", "multiple_select", "short_answer", "true_false"];
const DIFFICULTY: &[&str] = &["easy", "medium", "hard"];
const ASSIGNMENT_TYPES: &[&str] = &["project", "essay", "coding", "presentation", "research", "case_study"];
const SUBMISSION_FORMATS: &[&str] = &["file_upload", "text_submission", "url_submission", "multiple_files"];

/// Chance that an enrolled learner has taken a given assessment.
const RESULT_RATE: f64 = 0.6;
/// Chance that an enrolled learner has submitted a given assignment.
const SUBMISSION_RATE: f64 = 0.7;

pub fn assessments(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Assessments, &[EntityKind::Course, EntityKind::Instructor])?;
    let courses: Vec<_> = ctx
        .registry
        .all::<Course>()
        .iter()
        .map(|course| (course.id, course.coaching_center_id, course.primary_teacher_id))
        .collect();
    let timeline = ctx.timeline;
    let now = timeline.now();

    for (course_id, center_id, teacher_id) in courses {
        for number in 1..=ctx.counts.assessments_per_course {
            let id = ctx.new_id();
            let rng = &mut ctx.rng;
            let total_questions = int(rng, 10, 30);
            let marks_per_question = int(rng, 1, 4);
            let total_marks = total_questions * marks_per_question;

            let assessment = Assessment {
                id,
                course_id,
                chapter_id: None,
                lesson_id: None,
                coaching_center_id: center_id,
                teacher_id,
                title: format!("Test {number}: {}", Faker::catch_phrase(rng)),
                description: Faker::text(rng, 300),
                instructions: Faker::text(rng, 500),
                test_type: pick_string(rng, &["quiz", "assignment", "exam", "practice"]),
                difficulty_level: pick_string(rng, DIFFICULTY),
                total_questions,
                total_marks,
                passing_marks: round2(f64::from(total_marks) * uniform(rng, 0.4, 0.6)),
                negative_marking: coin(rng),
                negative_marks_per_question: maybe(rng, |rng| money(rng, 0.0, 1.0)).unwrap_or(0.0),
                time_limit_minutes: int(rng, 30, 180),
                extra_time_minutes: int(rng, 0, 30),
                attempts_allowed: int(rng, 1, 3),
                time_between_attempts_hours: int(rng, 0, 24),
                show_results_immediately: coin(rng),
                show_correct_answers: coin(rng),
                show_explanations: coin(rng),
                randomize_questions: coin(rng),
                randomize_options: coin(rng),
                available_from: timeline.days(rng, -30, 30),
                available_until: timeline.days(rng, 31, 180),
                is_published: chance(rng, 0.8),
                is_proctored: coin(rng),
                attempt_count: int(rng, 0, 100),
                average_score: money(rng, 60.0, 90.0),
                pass_rate: money(rng, 70.0, 95.0),
                created_at: now,
                updated_at: now,
            };
            ctx.insert(assessment)?;

            for order in 1..=total_questions {
                let question_id = ctx.new_id();
                let question = question(ctx, question_id, id, order, marks_per_question);
                ctx.insert(question)?;
            }
        }
    }
    Ok(())
}

/// Every question of an assessment carries the same marks, so the
/// assessment total divides evenly across its questions.
fn question(
    ctx: &mut GenerationContext,
    id: Uuid,
    test_id: Uuid,
    order: i32,
    marks: i32,
) -> AssessmentQuestion {
    let now = ctx.now();
    let rng = &mut ctx.rng;
    let question_type = *pick(rng, QUESTION_TYPES);
    let (options, correct): (Vec<String>, Vec<String>) = match question_type {
        "mcq" => {
            let options = Faker::sentences(rng, 4);
            let correct = vec![pick(rng, &options).clone()];
            (options, correct)
        }
        "multiple_select" => {
            let options = Faker::sentences(rng, 5);
            let amount = int(rng, 2, 3) as usize;
            let correct = options.choose_multiple(rng, amount).cloned().collect();
            (options, correct)
        }
        "true_false" => {
            let options = vec!["True".to_string(), "False".to_string()];
            let correct = vec![pick(rng, &options).clone()];
            (options, correct)
        }
        _ => (Vec::new(), vec![Faker::sentence(rng)]),
    };

    AssessmentQuestion {
        id,
        test_id,
        question_text: format!("{}?", Faker::text(rng, 300).trim_end_matches('.')),
        question_type: question_type.to_string(),
        options: json!(options),
        correct_answers: json!(correct),
        explanation: Faker::text(rng, 200),
        hints: Faker::sentences(rng, 2),
        marks,
        negative_marks: maybe(rng, |rng| money(rng, 0.0, 1.0)).unwrap_or(0.0),
        difficulty_level: pick_string(rng, DIFFICULTY),
        topic: Faker::word(rng),
        subtopic: Faker::word(rng),
        tags: Faker::words(rng, 3),
        question_order: order,
        time_limit_seconds: maybe(rng, |rng| int(rng, 60, 300)),
        attempt_count: int(rng, 0, 50),
        correct_count: int(rng, 0, 25),
        difficulty_score: money(rng, 0.1, 0.9),
        created_at: now,
        updated_at: now,
    }
}

pub fn assignments(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Assignments, &[EntityKind::Course, EntityKind::Instructor])?;
    let courses: Vec<_> = ctx
        .registry
        .all::<Course>()
        .iter()
        .map(|course| (course.id, course.primary_teacher_id))
        .collect();
    let timeline = ctx.timeline;
    let now = timeline.now();

    for (course_id, teacher_id) in courses {
        for number in 1..=ctx.counts.assignments_per_course {
            let id = ctx.new_id();
            let rng = &mut ctx.rng;
            let total_marks = money(rng, 50.0, 100.0);

            let assignment = Assignment {
                id,
                course_id,
                chapter_id: None,
                teacher_id,
                title: format!("Assignment {number}: {}", Faker::catch_phrase(rng)),
                description: Faker::text(rng, 800),
                instructions: Faker::text(rng, 600),
                assignment_type: pick_string(rng, ASSIGNMENT_TYPES),
                submission_format: pick_string(rng, SUBMISSION_FORMATS),
                total_marks,
                passing_marks: round2(total_marks * uniform(rng, 0.4, 0.6)).min(total_marks),
                grading_rubric: json!({
                    "criteria": [
                        {"name": "Content Quality", "weight": 40},
                        {"name": "Presentation", "weight": 30},
                        {"name": "Originality", "weight": 20},
                        {"name": "Timeliness", "weight": 10},
                    ]
                }),
                assigned_date: now,
                due_date: timeline.days(rng, 7, 30),
                late_submission_deadline: timeline.days(rng, 31, 40),
                allow_late_submission: coin(rng),
                late_penalty_percentage: money(rng, 5.0, 20.0),
                is_group_assignment: coin(rng),
                max_group_size: maybe(rng, |rng| int(rng, 2, 5)).unwrap_or(1),
                allow_resubmission: coin(rng),
                max_file_size_mb: int(rng, 10, 100),
                allowed_file_types: ["pdf", "doc", "docx", "txt", "zip"]
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
                resources: json!([{
                    "title": "Reference Material",
                    "url": SAMPLE_PDF_URL,
                    "type": "external_link",
                }]),
                reference_materials: json!([{"title": "Additional Reading", "url": SAMPLE_PDF_URL}]),
                sample_submissions: json!([]),
                is_published: chance(rng, 0.8),
                is_archived: false,
                submission_count: int(rng, 0, 50),
                on_time_submissions: int(rng, 0, 40),
                average_grade: money(rng, 70.0, 85.0),
                plagiarism_check_enabled: coin(rng),
                auto_grade_enabled: coin(rng),
                ai_feedback_enabled: coin(rng),
                created_at: now,
                updated_at: now,
            };
            ctx.insert(assignment)?;
        }
    }
    Ok(())
}

pub fn assessment_results(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::AssessmentResults, &[EntityKind::Assessment, EntityKind::Enrollment])?;
    let by_course = group_by(
        ctx.registry.all::<Assessment>(),
        |assessment| assessment.course_id,
        |assessment| assessment.id,
    );
    let timeline = ctx.timeline;
    let now = timeline.now();

    for enrollment in enrollment_refs(ctx) {
        let Some(assessment_ids) = by_course.get(&enrollment.course_id) else {
            continue;
        };
        for assessment_id in assessment_ids {
            if !chance(&mut ctx.rng, RESULT_RATE) {
                continue;
            }
            let assessment = ctx.registry.get::<Assessment>(*assessment_id)?;
            let (total_questions, total_marks, passing_marks) =
                (assessment.total_questions, assessment.total_marks, assessment.passing_marks);
            let (attempts_allowed, time_limit, is_proctored) = (
                assessment.attempts_allowed,
                assessment.time_limit_minutes,
                assessment.is_proctored,
            );
            let id = ctx.new_id();
            let rng = &mut ctx.rng;

            let skipped = int(rng, 0, total_questions / 4);
            let correct = int(rng, 0, total_questions - skipped);
            let incorrect = total_questions - skipped - correct;
            let score = round2(f64::from(correct) * f64::from(total_marks) / f64::from(total_questions));
            let passed =
                f64::from(correct) / f64::from(total_questions) >= passing_marks / f64::from(total_marks);

            let mut answers = Map::new();
            let mut analysis = Map::new();
            for question in 1..=total_questions {
                let answered = question <= total_questions - skipped;
                if answered {
                    answers.insert(format!("q_{question}"), Value::String(Faker::word(rng)));
                }
                analysis.insert(
                    format!("q_{question}"),
                    json!({
                        "answered": answered,
                        "time_taken": int(rng, 30, 180),
                        "marked_for_review": coin(rng),
                    }),
                );
            }
            let started_at = timeline.since(rng, enrollment.enrolled_at);
            let completed_at = timeline.since(rng, started_at);
            let is_flagged = chance(rng, 0.05);

            let result = AssessmentResult {
                id,
                test_id: *assessment_id,
                student_id: enrollment.student_id,
                attempt_number: int(rng, 1, attempts_allowed),
                started_at,
                completed_at,
                submitted_at: timeline.since(rng, completed_at),
                total_questions,
                questions_attempted: correct + incorrect + skipped,
                correct_answers: correct,
                incorrect_answers: incorrect,
                skipped_questions: skipped,
                score,
                total_marks,
                passed,
                grade: pick_string(rng, &["A+", "A", "B+", "B", "C+", "C", "D"]),
                time_taken_minutes: int(rng, 30.min(time_limit), time_limit),
                time_limit_minutes: time_limit,
                extra_time_used: 0,
                answers: Value::Object(answers),
                question_wise_analysis: Value::Object(analysis),
                is_submitted: true,
                is_flagged,
                flag_reason: if is_flagged { Some(Faker::sentence(rng)) } else { None },
                is_proctored,
                proctoring_data: if is_proctored {
                    json!({"violations": int(rng, 0, 2), "screenshots": int(rng, 5, 20)})
                } else {
                    json!({})
                },
                rank_in_test: None,
                percentile: percentage(rng, 50.0, 95.0),
                created_at: now,
                updated_at: now,
            };
            ctx.insert(result)?;
        }
    }
    Ok(())
}

pub fn assignment_submissions(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::AssignmentSubmissions, &[EntityKind::Assignment, EntityKind::Enrollment])?;
    let by_course = group_by(
        ctx.registry.all::<Assignment>(),
        |assignment| assignment.course_id,
        |assignment| assignment.id,
    );
    let timeline = ctx.timeline;
    let now = timeline.now();

    for enrollment in enrollment_refs(ctx) {
        let Some(assignment_ids) = by_course.get(&enrollment.course_id) else {
            continue;
        };
        for assignment_id in assignment_ids {
            if !chance(&mut ctx.rng, SUBMISSION_RATE) {
                continue;
            }
            let assignment = ctx.registry.get::<Assignment>(*assignment_id)?;
            let format = assignment.submission_format.clone();
            let (teacher_id, total_marks, plagiarism_checked) = (
                assignment.teacher_id,
                assignment.total_marks,
                assignment.plagiarism_check_enabled,
            );
            let opened_at = assignment.assigned_date.max(enrollment.enrolled_at);
            let id = ctx.new_id();
            let rng = &mut ctx.rng;

            let file_count = match format.as_str() {
                "file_upload" => 1,
                "multiple_files" => int(rng, 2, 3),
                _ => 0,
            };
            let files: Vec<Value> = (0..file_count)
                .map(|_| {
                    json!({
                        "name": format!("assignment_{}.pdf", int(rng, 1, 100)),
                        "url": SAMPLE_PDF_URL,
                        "size": int(rng, 1000, 5_000_000),
                        "type": "pdf",
                    })
                })
                .collect();
            let graded = coin(rng);
            let submitted_at = timeline.since(rng, opened_at);

            let submission = AssignmentSubmission {
                id,
                assignment_id: *assignment_id,
                student_id: enrollment.student_id,
                submission_text: (format == "text_submission").then(|| Faker::text(rng, 800)),
                submission_files: Value::Array(files),
                submission_urls: if format == "url_submission" {
                    json!([Faker::url(rng)])
                } else {
                    json!([])
                },
                attempt_number: int(rng, 1, 2),
                submitted_at,
                is_late: coin(rng),
                grade: graded.then(|| round2(total_marks * uniform(rng, 0.6, 0.95))),
                feedback: graded.then(|| Faker::text(rng, 300)),
                detailed_feedback: if graded {
                    json!({
                        "content_quality": "Good analysis and understanding demonstrated",
                        "presentation": "Well structured and clearly presented",
                        "originality": "Shows original thinking and creativity",
                        "areas_for_improvement": "Could include more examples",
                    })
                } else {
                    json!({})
                },
                graded_at: graded.then(|| timeline.since(rng, submitted_at)),
                graded_by: graded.then_some(teacher_id),
                submission_status: if graded {
                    "graded".to_string()
                } else {
                    pick_string(rng, &["submitted", "under_review"])
                },
                plagiarism_score: plagiarism_checked.then(|| money(rng, 0.0, 15.0)),
                plagiarism_report: if plagiarism_checked {
                    json!({
                        "sources_found": int(rng, 0, 3),
                        "similarity_percentage": money(rng, 0.0, 15.0),
                        "status": "clean",
                    })
                } else {
                    json!({})
                },
                word_count: int(rng, 500, 2000),
                total_file_size_mb: if file_count > 0 { money(rng, 1.0, 10.0) } else { 0.0 },
                file_count,
                created_at: now,
                updated_at: now,
                metadata: json!({
                    "device": pick_string(rng, &["mobile", "desktop", "tablet"]),
                    "browser": pick_string(rng, &["Chrome", "Firefox", "Safari", "Edge"]),
                }),
            };
            ctx.insert(submission)?;
        }
    }
    Ok(())
}

