#[cfg(test)]
mod integration_tests {
    use crate::handlers::family_members::CreateFamilyMemberRequest;
    use crate::handlers::instances::{CreateInstanceRequest, RecordPaymentRequest};
    use crate::handlers::insurance_policies::CreateInsurancePolicyRequest;
    use crate::handlers::loans::{CreateLoanRequest, UpdateLoanRequest};
    use crate::handlers::schedules::{CreateScheduleRequest, UpdateScheduleRequest};
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::setup_test_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn decimal_field(value: &serde_json::Value) -> Decimal {
        Decimal::from_str(value.as_str().expect("expected decimal string")).unwrap()
    }

    fn monthly_schedule_request(name: &str, due_day: i32, amount: &str) -> CreateScheduleRequest {
        CreateScheduleRequest {
            name: name.to_string(),
            description: None,
            frequency: "Monthly".to_string(),
            due_day,
            due_months: None,
            start_date: date(2026, 1, 1),
            amount: Decimal::from_str(amount).unwrap(),
            family_member_id: 1,
        }
    }

    async fn create_schedule(server: &TestServer, request: &CreateScheduleRequest) -> i64 {
        let response = server.post("/api/v1/schedules").json(request).await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        // Setup test server
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Send GET request to health endpoint
        let response = server.get("/health").await;

        // Verify response
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_family_member() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = CreateFamilyMemberRequest {
            name: "Meera".to_string(),
            relationship: Some("daughter".to_string()),
        };

        let response = server.post("/api/v1/family-members").json(&create_request).await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        assert_eq!(body.data["name"], "Meera");
        assert!(body.data["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_duplicate_family_member_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // "Asha" is seeded by the test fixture
        let create_request = CreateFamilyMemberRequest {
            name: "Asha".to_string(),
            relationship: None,
        };

        let response = server.post("/api/v1/family-members").json(&create_request).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "FAMILY_MEMBER_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_get_family_members() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/family-members").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert!(body.success);
        assert!(body.data.len() >= 2);
        assert!(body.data.iter().any(|m| m["name"] == "Asha"));
    }

    #[tokio::test]
    async fn test_create_monthly_schedule() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = monthly_schedule_request("Electricity", 10, "1500");

        let response = server.post("/api/v1/schedules").json(&create_request).await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        assert_eq!(body.data["name"], "Electricity");
        assert_eq!(body.data["frequency"], "Monthly");
        assert_eq!(body.data["due_day_display"], "10th");
        assert_eq!(body.data["is_auto_linked"], false);
    }

    #[tokio::test]
    async fn test_create_schedule_invalid_frequency() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let mut create_request = monthly_schedule_request("Water", 5, "300");
        create_request.frequency = "Fortnightly".to_string();

        let response = server.post("/api/v1/schedules").json(&create_request).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_custom_schedule_requires_months() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let mut create_request = monthly_schedule_request("School fees", 5, "25000");
        create_request.frequency = "Custom".to_string();
        create_request.due_months = None;

        let response = server.post("/api/v1/schedules").json(&create_request).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_schedule_unknown_family_member() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let mut create_request = monthly_schedule_request("Rent", 1, "20000");
        create_request.family_member_id = 9999;

        let response = server.post("/api/v1/schedules").json(&create_request).await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "FAMILY_MEMBER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_half_yearly_next_due_projection() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = CreateScheduleRequest {
            name: "Property tax".to_string(),
            description: None,
            frequency: "HalfYearly".to_string(),
            due_day: 10,
            due_months: None,
            start_date: date(2026, 1, 1),
            amount: Decimal::from_str("8000").unwrap(),
            family_member_id: 1,
        };
        let schedule_id = create_schedule(&server, &create_request).await;

        // January's occurrence has passed by the 19th, so the next one
        // falls in July
        let response = server
            .get(&format!("/api/v1/schedules/{}?as_of=2026-01-19", schedule_id))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["next_due_date"], "2026-07-10");
        assert_eq!(body.data["due_status"], "Upcoming");
    }

    #[tokio::test]
    async fn test_due_today_counts_as_next_occurrence() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = monthly_schedule_request("Broadband", 15, "800");
        let schedule_id = create_schedule(&server, &create_request).await;

        let response = server
            .get(&format!("/api/v1/schedules/{}?as_of=2026-03-15", schedule_id))
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["next_due_date"], "2026-03-15");
        assert_eq!(body.data["due_status"], "DueToday");
    }

    #[tokio::test]
    async fn test_update_schedule() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = monthly_schedule_request("Gym", 1, "1200");
        let schedule_id = create_schedule(&server, &create_request).await;

        let update_request = UpdateScheduleRequest {
            name: None,
            description: None,
            frequency: None,
            due_day: Some(7),
            due_months: None,
            start_date: None,
            amount: Some(Decimal::from_str("1400").unwrap()),
        };

        let response = server
            .put(&format!("/api/v1/schedules/{}", schedule_id))
            .json(&update_request)
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["due_day"], 7);
        assert_eq!(decimal_field(&body.data["amount"]), Decimal::from_str("1400").unwrap());
    }

    #[tokio::test]
    async fn test_auto_linked_schedule_rejects_edit_and_delete() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Creating an insurance policy materializes its premium schedule
        let policy_request = CreateInsurancePolicyRequest {
            name: "Term life".to_string(),
            provider: "LIC".to_string(),
            premium: Decimal::from_str("12000").unwrap(),
            frequency: "Yearly".to_string(),
            due_day: 5,
            due_months: Some(vec![4]),
            start_date: date(2026, 1, 1),
            family_member_id: 1,
        };
        let policy_response = server
            .post("/api/v1/insurance-policies")
            .json(&policy_request)
            .await;
        policy_response.assert_status(StatusCode::CREATED);
        let policy_body: ApiResponse<serde_json::Value> = policy_response.json();
        let schedule_id = policy_body.data["premium_schedule"]["id"].as_i64().unwrap();
        assert_eq!(policy_body.data["premium_schedule"]["is_auto_linked"], true);

        // Direct edits of the derived schedule are refused
        let update_request = UpdateScheduleRequest {
            name: Some("Renamed".to_string()),
            description: None,
            frequency: None,
            due_day: None,
            due_months: None,
            start_date: None,
            amount: None,
        };
        let update_response = server
            .put(&format!("/api/v1/schedules/{}", schedule_id))
            .json(&update_request)
            .await;
        update_response.assert_status(StatusCode::CONFLICT);
        let update_body: serde_json::Value = update_response.json();
        assert_eq!(update_body["code"], "AUTO_LINKED_SCHEDULE");

        // As are direct deletes
        let delete_response = server
            .delete(&format!("/api/v1/schedules/{}", schedule_id))
            .await;
        delete_response.assert_status(StatusCode::CONFLICT);
        let delete_body: serde_json::Value = delete_response.json();
        assert_eq!(delete_body["code"], "AUTO_LINKED_SCHEDULE");
    }

    #[tokio::test]
    async fn test_instance_payment_flow() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = monthly_schedule_request("Electricity", 10, "1500");
        let schedule_id = create_schedule(&server, &create_request).await;

        // Materialize February's occurrence; the expected amount is
        // copied from the definition
        let instance_request = CreateInstanceRequest {
            due_date: date(2026, 2, 10),
            expected_amount: None,
        };
        let instance_response = server
            .post(&format!("/api/v1/schedules/{}/instances", schedule_id))
            .json(&instance_request)
            .await;
        instance_response.assert_status(StatusCode::CREATED);
        let instance_body: ApiResponse<serde_json::Value> = instance_response.json();
        let instance_id = instance_body.data["id"].as_i64().unwrap();
        assert_eq!(
            decimal_field(&instance_body.data["expected_amount"]),
            Decimal::from_str("1500").unwrap()
        );

        // Record a partial payment
        let payment_request = RecordPaymentRequest {
            paid_amount: Some(Decimal::from_str("1450").unwrap()),
            paid_date: Some(date(2026, 2, 9)),
        };
        let payment_response = server
            .put(&format!("/api/v1/instances/{}/payment", instance_id))
            .json(&payment_request)
            .await;
        payment_response.assert_status(StatusCode::OK);
        let payment_body: ApiResponse<serde_json::Value> = payment_response.json();
        assert_eq!(payment_body.data["state"], "Paid");
        assert_eq!(
            decimal_field(&payment_body.data["paid_amount"]),
            Decimal::from_str("1450").unwrap()
        );
        assert_eq!(payment_body.data["paid_date"], "2026-02-09");

        // Paid is terminal
        let second_payment = server
            .put(&format!("/api/v1/instances/{}/payment", instance_id))
            .json(&payment_request)
            .await;
        second_payment.assert_status(StatusCode::CONFLICT);
        let second_body: serde_json::Value = second_payment.json();
        assert_eq!(second_body["code"], "INSTANCE_ALREADY_PAID");
    }

    #[tokio::test]
    async fn test_instance_rejected_outside_due_months() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = CreateScheduleRequest {
            name: "Property tax".to_string(),
            description: None,
            frequency: "HalfYearly".to_string(),
            due_day: 10,
            due_months: None,
            start_date: date(2026, 1, 1),
            amount: Decimal::from_str("8000").unwrap(),
            family_member_id: 1,
        };
        let schedule_id = create_schedule(&server, &create_request).await;

        // March is not a due month for a half-yearly schedule
        let instance_request = CreateInstanceRequest {
            due_date: date(2026, 3, 10),
            expected_amount: None,
        };
        let response = server
            .post(&format!("/api/v1/schedules/{}/instances", schedule_id))
            .json(&instance_request)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "INVALID_DUE_DATE");
    }

    #[tokio::test]
    async fn test_duplicate_instance_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = monthly_schedule_request("Rent", 1, "20000");
        let schedule_id = create_schedule(&server, &create_request).await;

        let instance_request = CreateInstanceRequest {
            due_date: date(2026, 5, 1),
            expected_amount: None,
        };

        let first = server
            .post(&format!("/api/v1/schedules/{}/instances", schedule_id))
            .json(&instance_request)
            .await;
        first.assert_status(StatusCode::CREATED);

        let second = server
            .post(&format!("/api/v1/schedules/{}/instances", schedule_id))
            .json(&instance_request)
            .await;
        second.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = second.json();
        assert_eq!(body["code"], "INSTANCE_EXISTS");
    }

    #[tokio::test]
    async fn test_month_summary_buckets() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let first_id = create_schedule(&server, &monthly_schedule_request("Water", 5, "100")).await;
        create_schedule(&server, &monthly_schedule_request("Power", 15, "200")).await;
        create_schedule(&server, &monthly_schedule_request("Internet", 25, "300")).await;

        // Pay March's water bill
        let instance_request = CreateInstanceRequest {
            due_date: date(2026, 3, 5),
            expected_amount: None,
        };
        let instance_response = server
            .post(&format!("/api/v1/schedules/{}/instances", first_id))
            .json(&instance_request)
            .await;
        instance_response.assert_status(StatusCode::CREATED);
        let instance_body: ApiResponse<serde_json::Value> = instance_response.json();
        let instance_id = instance_body.data["id"].as_i64().unwrap();

        let payment_request = RecordPaymentRequest {
            paid_amount: None,
            paid_date: Some(date(2026, 3, 5)),
        };
        server
            .put(&format!("/api/v1/instances/{}/payment", instance_id))
            .json(&payment_request)
            .await
            .assert_status(StatusCode::OK);

        // On March 20th: water is paid, power (15th) is overdue,
        // internet (25th) is still upcoming
        let response = server
            .get("/api/v1/schedules/summary?year=2026&month=3&as_of=2026-03-20")
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        assert_eq!(body.data["items"].as_array().unwrap().len(), 3);
        assert_eq!(decimal_field(&body.data["total_amount"]), Decimal::from_str("600").unwrap());
        assert_eq!(decimal_field(&body.data["paid_amount"]), Decimal::from_str("100").unwrap());
        // Overdue amounts stay in the pending bucket as well
        assert_eq!(decimal_field(&body.data["pending_amount"]), Decimal::from_str("500").unwrap());
        assert_eq!(decimal_field(&body.data["overdue_amount"]), Decimal::from_str("200").unwrap());
    }

    #[tokio::test]
    async fn test_month_summary_invalid_month() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/schedules/summary?year=2026&month=13").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_quarterly_schedule_only_in_due_months() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = CreateScheduleRequest {
            name: "Car insurance".to_string(),
            description: None,
            frequency: "Quarterly".to_string(),
            due_day: 12,
            due_months: None,
            start_date: date(2026, 1, 1),
            amount: Decimal::from_str("4500").unwrap(),
            family_member_id: 2,
        };
        create_schedule(&server, &create_request).await;

        // February is not a quarter month
        let february = server
            .get("/api/v1/schedules/summary?year=2026&month=2&as_of=2026-01-01")
            .await;
        february.assert_status(StatusCode::OK);
        let february_body: ApiResponse<serde_json::Value> = february.json();
        assert_eq!(february_body.data["items"].as_array().unwrap().len(), 0);

        // April is
        let april = server
            .get("/api/v1/schedules/summary?year=2026&month=4&as_of=2026-01-01")
            .await;
        april.assert_status(StatusCode::OK);
        let april_body: ApiResponse<serde_json::Value> = april.json();
        assert_eq!(april_body.data["items"].as_array().unwrap().len(), 1);
        assert_eq!(april_body.data["items"][0]["due_date"], "2026-04-12");
    }

    #[tokio::test]
    async fn test_year_calendar_has_twelve_months() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        create_schedule(&server, &monthly_schedule_request("Rent", 1, "20000")).await;

        let response = server.get("/api/v1/schedules/calendar/2026?as_of=2026-01-01").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 12);
        assert_eq!(body.data[0]["month"], 1);
        assert_eq!(body.data[11]["month"], 12);
        for month in &body.data {
            assert_eq!(month["items"].as_array().unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_loan_creates_emi_schedule() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let loan_request = CreateLoanRequest {
            name: "Home loan".to_string(),
            lender: "HDFC".to_string(),
            principal: Decimal::from_str("2500000").unwrap(),
            emi_amount: Decimal::from_str("21500").unwrap(),
            emi_day: 3,
            start_date: date(2026, 1, 1),
            family_member_id: 1,
        };

        let response = server.post("/api/v1/loans").json(&loan_request).await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        let emi_schedule = &body.data["emi_schedule"];
        assert_eq!(emi_schedule["name"], "Home loan EMI");
        assert_eq!(emi_schedule["frequency"], "Monthly");
        assert_eq!(emi_schedule["is_auto_linked"], true);
        assert_eq!(decimal_field(&emi_schedule["amount"]), Decimal::from_str("21500").unwrap());
    }

    #[tokio::test]
    async fn test_update_loan_propagates_to_emi_schedule() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let loan_request = CreateLoanRequest {
            name: "Car loan".to_string(),
            lender: "SBI".to_string(),
            principal: Decimal::from_str("600000").unwrap(),
            emi_amount: Decimal::from_str("11000").unwrap(),
            emi_day: 7,
            start_date: date(2026, 1, 1),
            family_member_id: 2,
        };
        let create_response = server.post("/api/v1/loans").json(&loan_request).await;
        create_response.assert_status(StatusCode::CREATED);
        let create_body: ApiResponse<serde_json::Value> = create_response.json();
        let loan_id = create_body.data["id"].as_i64().unwrap();
        let schedule_id = create_body.data["emi_schedule"]["id"].as_i64().unwrap();

        let update_request = UpdateLoanRequest {
            name: None,
            lender: None,
            principal: None,
            emi_amount: Some(Decimal::from_str("12500").unwrap()),
            emi_day: Some(9),
            start_date: None,
        };
        let update_response = server
            .put(&format!("/api/v1/loans/{}", loan_id))
            .json(&update_request)
            .await;
        update_response.assert_status(StatusCode::OK);

        // The EMI schedule follows the loan terms
        let schedule_response = server
            .get(&format!("/api/v1/schedules/{}", schedule_id))
            .await;
        schedule_response.assert_status(StatusCode::OK);
        let schedule_body: ApiResponse<serde_json::Value> = schedule_response.json();
        assert_eq!(schedule_body.data["due_day"], 9);
        assert_eq!(
            decimal_field(&schedule_body.data["amount"]),
            Decimal::from_str("12500").unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_insurance_policy_removes_premium_schedule() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let policy_request = CreateInsurancePolicyRequest {
            name: "Health cover".to_string(),
            provider: "Star".to_string(),
            premium: Decimal::from_str("18000").unwrap(),
            frequency: "Yearly".to_string(),
            due_day: 20,
            due_months: Some(vec![6]),
            start_date: date(2026, 1, 1),
            family_member_id: 1,
        };
        let create_response = server
            .post("/api/v1/insurance-policies")
            .json(&policy_request)
            .await;
        create_response.assert_status(StatusCode::CREATED);
        let create_body: ApiResponse<serde_json::Value> = create_response.json();
        let policy_id = create_body.data["id"].as_i64().unwrap();
        let schedule_id = create_body.data["premium_schedule"]["id"].as_i64().unwrap();

        let delete_response = server
            .delete(&format!("/api/v1/insurance-policies/{}", policy_id))
            .await;
        delete_response.assert_status(StatusCode::OK);

        // The derived schedule goes with the policy
        let schedule_response = server
            .get(&format!("/api/v1/schedules/{}", schedule_id))
            .await;
        schedule_response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summary_cache_invalidated_on_payment() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let schedule_id =
            create_schedule(&server, &monthly_schedule_request("Water", 5, "100")).await;

        // Prime the cache
        let before = server
            .get("/api/v1/schedules/summary?year=2026&month=3&as_of=2026-03-01")
            .await;
        before.assert_status(StatusCode::OK);
        let before_body: ApiResponse<serde_json::Value> = before.json();
        assert_eq!(decimal_field(&before_body.data["paid_amount"]), Decimal::ZERO);

        let instance_request = CreateInstanceRequest {
            due_date: date(2026, 3, 5),
            expected_amount: None,
        };
        let instance_response = server
            .post(&format!("/api/v1/schedules/{}/instances", schedule_id))
            .json(&instance_request)
            .await;
        instance_response.assert_status(StatusCode::CREATED);
        let instance_body: ApiResponse<serde_json::Value> = instance_response.json();
        let instance_id = instance_body.data["id"].as_i64().unwrap();

        let payment_request = RecordPaymentRequest {
            paid_amount: None,
            paid_date: Some(date(2026, 3, 4)),
        };
        server
            .put(&format!("/api/v1/instances/{}/payment", instance_id))
            .json(&payment_request)
            .await
            .assert_status(StatusCode::OK);

        // Same query again reflects the payment
        let after = server
            .get("/api/v1/schedules/summary?year=2026&month=3&as_of=2026-03-01")
            .await;
        after.assert_status(StatusCode::OK);
        let after_body: ApiResponse<serde_json::Value> = after.json();
        assert_eq!(
            decimal_field(&after_body.data["paid_amount"]),
            Decimal::from_str("100").unwrap()
        );
    }
}
