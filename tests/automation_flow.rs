//! 自动投递流程的端到端测试：内存假页面 + mock 后端，时间暂停

use std::sync::{Arc, Mutex};
use std::time::Duration;

use auto_apply::error::ApiError;
use auto_apply::infrastructure::DomEvent;
use auto_apply::models::{ApplicationMaterials, ApplicationOutcome, SiteConfig};
use auto_apply::testing::{FakePage, MockMaterialsService, MockOutcomeReporter};
use auto_apply::{AutomationController, AutomationState, SiteRegistry};
use tokio::time::{sleep, Instant};

const RESUME_URL: &str = "https://x/r.pdf";
const COVER_LETTER: &str = "Dear Hiring Manager...";

fn linkedin() -> SiteConfig {
    SiteRegistry::builtin()
        .resolve("www.linkedin.com")
        .cloned()
        .unwrap()
}

/// 职位页面，申请表单默认已经打开
fn job_page(site: &SiteConfig) -> FakePage {
    let page = FakePage::new("www.linkedin.com")
        .with_element(site.apply_trigger.as_str(), "Easy Apply")
        .with_element(site.job_title.as_str(), "Software Engineer")
        .with_element(site.company_name.as_str(), "Acme")
        .with_element(site.job_description.as_str(), "Build things");
    page.serve(RESUME_URL, "application/pdf", 4096);
    page
}

fn with_form(page: FakePage, site: &SiteConfig) -> FakePage {
    page.with_element(site.cover_letter_input.as_str(), "")
        .with_element(site.resume_input.as_str(), "")
        .with_element(site.submit_control.as_str(), "Submit application")
}

fn stub_materials() -> MockMaterialsService {
    let mut materials = MockMaterialsService::new();
    materials
        .expect_request_materials()
        .returning(|_| Ok(ApplicationMaterials::new(COVER_LETTER, RESUME_URL)));
    materials
}

/// 记录所有上报结果的 reporter
fn recording_reporter() -> (MockOutcomeReporter, Arc<Mutex<Vec<ApplicationOutcome>>>) {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let mut reporter = MockOutcomeReporter::new();
    reporter.expect_report().returning(move |outcome| {
        sink.lock().unwrap().push(outcome.clone());
        Ok(())
    });
    (reporter, reported)
}

fn controller(
    page: &FakePage,
    materials: MockMaterialsService,
    reporter: MockOutcomeReporter,
) -> AutomationController {
    AutomationController::new(
        Arc::new(page.clone()),
        Arc::new(SiteRegistry::builtin()),
        Arc::new(materials),
        Arc::new(reporter),
    )
}

/// 挂好监听后点击申请按钮，返回控制器的最终状态
async fn click_and_run(page: &FakePage, mut controller: AutomationController) -> AutomationState {
    let site = linkedin();
    let clicker = page.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        clicker.user_click(site.apply_trigger.as_str());
    });
    controller.run().await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn unregistered_hostname_stays_inert() {
    let page = FakePage::new("example.org").with_element("button.jobs-apply-button", "Apply");
    let (reporter, reported) = recording_reporter();
    let mut ctl = controller(&page, MockMaterialsService::new(), reporter);

    assert_eq!(ctl.run().await.unwrap(), AutomationState::Inactive);
    assert_eq!(page.active_click_listeners(), 0);
    assert_eq!(page.active_observers(), 0);
    assert!(reported.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn successful_application_is_logged_once() {
    let site = linkedin();
    let page = with_form(job_page(&site), &site);
    let (reporter, reported) = recording_reporter();

    let mut materials = MockMaterialsService::new();
    materials
        .expect_request_materials()
        .withf(|job| {
            job.title == "Software Engineer" && job.company == "Acme" && job.description == "Build things"
        })
        .times(1)
        .returning(|_| Ok(ApplicationMaterials::new(COVER_LETTER, RESUME_URL)));

    let state = click_and_run(&page, controller(&page, materials, reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: true });
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert!(reported[0].is_success());
    assert_eq!(reported[0].title(), "Software Engineer");
    assert_eq!(reported[0].company(), "Acme");

    assert_eq!(page.value_of(site.cover_letter_input.as_str()).as_deref(), Some(COVER_LETTER));
    assert_eq!(
        page.events_of(site.cover_letter_input.as_str()),
        vec![DomEvent::Input, DomEvent::Change]
    );
    assert_eq!(page.files_of(site.resume_input.as_str())[0].name, "r.pdf");
    assert_eq!(page.clicks_of(site.submit_control.as_str()), 1);
    assert!(page.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn service_error_fails_without_touching_the_form() {
    let site = linkedin();
    let page = with_form(job_page(&site), &site);
    let (reporter, reported) = recording_reporter();

    let mut materials = MockMaterialsService::new();
    materials.expect_request_materials().times(1).returning(|_| {
        Err(ApiError::Service {
            endpoint: "/apply/generate".into(),
            status: 500,
            message: "Unknown error".into(),
        })
    });

    let state = click_and_run(&page, controller(&page, materials, reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: false });
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert!(!reported[0].is_success());
    assert!(reported[0].details().starts_with("materials request failed"));
    assert!(reported[0].details().contains("service error 500"));
    assert_eq!(page.write_count(), 0);
    assert_eq!(page.alerts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_resume_input_fails_even_with_cover_letter_filled() {
    let site = linkedin();
    let page = job_page(&site)
        .with_element(site.cover_letter_input.as_str(), "")
        .with_element(site.submit_control.as_str(), "Submit application");
    let (reporter, reported) = recording_reporter();

    let state = click_and_run(&page, controller(&page, stub_materials(), reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: false });
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert!(reported[0].details().starts_with("resume upload failed"));
    assert_eq!(page.value_of(site.cover_letter_input.as_str()).as_deref(), Some(COVER_LETTER));
    assert_eq!(page.clicks_of(site.submit_control.as_str()), 0);
    assert_eq!(
        page.alerts(),
        vec!["auto-apply: Failed to upload resume. Please upload manually.".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_resume_input_fails_without_cover_letter_too() {
    let site = linkedin();
    let page = job_page(&site).with_element(site.submit_control.as_str(), "Submit application");
    let (reporter, reported) = recording_reporter();

    let state = click_and_run(&page, controller(&page, stub_materials(), reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: false });
    assert!(reported.lock().unwrap()[0]
        .details()
        .starts_with("resume upload failed"));
}

#[tokio::test(start_paused = true)]
async fn blocked_file_assignment_is_reported_as_restricted() {
    let site = linkedin();
    let page = with_form(job_page(&site), &site);
    page.restrict_file_inputs();
    let (reporter, reported) = recording_reporter();

    let state = click_and_run(&page, controller(&page, stub_materials(), reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: false });
    let details = reported.lock().unwrap()[0].details().to_string();
    assert!(details.starts_with("resume upload failed: browser refused programmatic file assignment"));
}

#[tokio::test(start_paused = true)]
async fn missing_submit_control_asks_for_manual_completion() {
    let site = linkedin();
    let page = job_page(&site)
        .with_element(site.cover_letter_input.as_str(), "")
        .with_element(site.resume_input.as_str(), "");
    let (reporter, reported) = recording_reporter();

    let state = click_and_run(&page, controller(&page, stub_materials(), reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: false });
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].details(), "submit control not found");
    assert_eq!(
        page.alerts(),
        vec!["auto-apply: Submit button not found. Please complete manually.".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn double_click_yields_a_single_outcome() {
    let site = linkedin();
    let page = with_form(job_page(&site), &site);
    let (reporter, reported) = recording_reporter();

    let mut materials = MockMaterialsService::new();
    materials
        .expect_request_materials()
        .times(1)
        .returning(|_| Ok(ApplicationMaterials::new(COVER_LETTER, RESUME_URL)));

    let mut ctl = controller(&page, materials, reporter);
    ctl.start().await.unwrap();
    ctl.arm().await.unwrap();

    page.user_click(site.apply_trigger.as_str());
    page.user_click(site.apply_trigger.as_str());

    assert!(ctl.wait_for_trigger().await);
    assert!(ctl.on_trigger().await.is_some());
    // 第二次点击已随一次性监听一起丢弃
    assert!(!ctl.wait_for_trigger().await);
    assert!(ctl.on_trigger().await.is_none());

    assert_eq!(reported.lock().unwrap().len(), 1);
    assert_eq!(page.clicks_of(site.submit_control.as_str()), 1);
    assert_eq!(page.active_click_listeners(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_apply_button_is_armed_when_it_appears() {
    let site = linkedin();
    let page = FakePage::new("www.linkedin.com");
    let (reporter, reported) = recording_reporter();

    let inserter = page.clone();
    let trigger = site.apply_trigger.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(4_000)).await;
        inserter.insert(trigger.as_str(), "Easy Apply");
    });

    let mut ctl = controller(&page, MockMaterialsService::new(), reporter);
    ctl.start().await.unwrap();

    let start = Instant::now();
    assert_eq!(ctl.arm().await.unwrap(), AutomationState::TriggerArmed);
    assert_eq!(start.elapsed(), Duration::from_millis(4_000));
    assert_eq!(page.active_observers(), 0);
    assert_eq!(page.active_click_listeners(), 1);
    assert!(reported.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn form_opening_after_the_click_is_waited_for() {
    let site = linkedin();
    let page = job_page(&site);
    let (reporter, reported) = recording_reporter();

    // 点击申请一秒多之后表单才出现
    let form = page.clone();
    let form_site = site.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(1_300)).await;
        form.insert(form_site.cover_letter_input.as_str(), "");
        form.insert(form_site.resume_input.as_str(), "");
        form.insert(form_site.submit_control.as_str(), "Submit application");
    });

    let state = click_and_run(&page, controller(&page, stub_materials(), reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: true });
    assert_eq!(reported.lock().unwrap().len(), 1);
    assert_eq!(page.value_of(site.cover_letter_input.as_str()).as_deref(), Some(COVER_LETTER));
}

#[tokio::test(start_paused = true)]
async fn missing_job_fields_still_produce_one_outcome() {
    let site = linkedin();
    let page = FakePage::new("www.linkedin.com")
        .with_element(site.apply_trigger.as_str(), "Easy Apply");
    let page = with_form(page, &site);
    page.serve(RESUME_URL, "application/pdf", 4096);
    let (reporter, reported) = recording_reporter();

    let mut materials = MockMaterialsService::new();
    materials
        .expect_request_materials()
        .withf(|job| job.title == "unknown" && job.company == "unknown")
        .times(1)
        .returning(|_| Ok(ApplicationMaterials::new(COVER_LETTER, RESUME_URL)));

    let state = click_and_run(&page, controller(&page, materials, reporter)).await;

    assert_eq!(state, AutomationState::Logged { success: true });
    let reported = reported.lock().unwrap();
    assert_eq!(reported[0].title(), "unknown");
}
