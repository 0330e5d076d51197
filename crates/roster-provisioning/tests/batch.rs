// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end batch runs against in-memory collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use roster_common_secret::SecretString;
use roster_config::ProvisioningConfig;
use roster_provisioning::{
	BatchOutcome, Candidate, CompanionEntry, CompanionOutcome, CompanionStage, CreatedAccount, Delay,
	DirectoryService, DocumentType, ExistingIdentity, GroupAssignment, NewAccount, NotificationOutcome,
	NotificationService, NotificationStage, OutgoingMessage, ProvisioningError, ProvisioningOrchestrator,
	RecordState, RequestType, Resolution, RoleCategory, ServiceError, StageError, WebAppService,
};

const DOMAIN: &str = "example.edu";

#[derive(Default)]
struct FakeDirectory {
	roster: Vec<ExistingIdentity>,
	groups: HashMap<String, String>,
	fail_create_for: Vec<String>,
	/// Addresses whose group assignment is always rejected.
	reject_assign_for: Vec<String>,
	assign_script: Mutex<VecDeque<GroupAssignment>>,
	created: Mutex<Vec<NewAccount>>,
	group_lookups: Mutex<usize>,
	assign_calls: Mutex<usize>,
}

impl FakeDirectory {
	fn with_groups() -> Self {
		let mut groups = HashMap::new();
		groups.insert("Students".to_string(), "grp-students".to_string());
		groups.insert("Staff".to_string(), "grp-staff".to_string());
		Self {
			groups,
			..Default::default()
		}
	}

	fn script_assignments(self, script: Vec<GroupAssignment>) -> Self {
		*self.assign_script.lock().unwrap() = script.into();
		self
	}

	fn created_addresses(&self) -> Vec<String> {
		self.created.lock().unwrap().iter().map(|a| a.address.clone()).collect()
	}
}

#[async_trait]
impl DirectoryService for FakeDirectory {
	async fn list_identities(&self, _domain: &str) -> Result<Vec<ExistingIdentity>, ServiceError> {
		Ok(self.roster.clone())
	}

	async fn create_account(&self, account: &NewAccount) -> Result<CreatedAccount, ServiceError> {
		if self.fail_create_for.contains(&account.address) {
			return Err(ServiceError::new("insufficient privileges"));
		}
		let mut created = self.created.lock().unwrap();
		created.push(account.clone());
		Ok(CreatedAccount {
			id: format!("acct-{}", created.len()),
		})
	}

	async fn resolve_group_id(&self, name: &str) -> Result<Option<String>, ServiceError> {
		*self.group_lookups.lock().unwrap() += 1;
		Ok(self.groups.get(name).cloned())
	}

	async fn assign_to_group(&self, account_id: &str, _group_id: &str) -> GroupAssignment {
		*self.assign_calls.lock().unwrap() += 1;
		let address = account_id
			.strip_prefix("acct-")
			.and_then(|n| n.parse::<usize>().ok())
			.and_then(|n| n.checked_sub(1))
			.and_then(|i| self.created.lock().unwrap().get(i).map(|a| a.address.clone()));
		if address.is_some_and(|a| self.reject_assign_for.contains(&a)) {
			return GroupAssignment::Rejected {
				status: Some(404),
				message: "Resource does not exist".to_string(),
			};
		}
		self.assign_script
			.lock()
			.unwrap()
			.pop_front()
			.unwrap_or(GroupAssignment::Added)
	}
}

struct UnreachableDirectory;

#[async_trait]
impl DirectoryService for UnreachableDirectory {
	async fn list_identities(&self, _domain: &str) -> Result<Vec<ExistingIdentity>, ServiceError> {
		Err(ServiceError::timeout("directory did not answer"))
	}

	async fn create_account(&self, _account: &NewAccount) -> Result<CreatedAccount, ServiceError> {
		Err(ServiceError::new("unreachable"))
	}

	async fn resolve_group_id(&self, _name: &str) -> Result<Option<String>, ServiceError> {
		Err(ServiceError::new("unreachable"))
	}

	async fn assign_to_group(&self, _account_id: &str, _group_id: &str) -> GroupAssignment {
		GroupAssignment::Rejected {
			status: None,
			message: "unreachable".to_string(),
		}
	}
}

#[derive(Default)]
struct RecordingDelay {
	waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
	fn waits(&self) -> Vec<Duration> {
		self.waits.lock().unwrap().clone()
	}
}

#[async_trait]
impl Delay for RecordingDelay {
	async fn sleep(&self, duration: Duration) {
		self.waits.lock().unwrap().push(duration);
	}
}

#[derive(Default)]
struct FakeWebApp {
	reject_login: bool,
	existing_usernames: Vec<String>,
	entries: Mutex<Vec<CompanionEntry>>,
}

#[async_trait]
impl WebAppService for FakeWebApp {
	async fn authenticate(&self) -> Result<(), ServiceError> {
		if self.reject_login {
			Err(ServiceError::new("invalid credentials"))
		} else {
			Ok(())
		}
	}

	async fn create_entry(&self, entry: &CompanionEntry) -> CompanionOutcome {
		self.entries.lock().unwrap().push(entry.clone());
		if self.existing_usernames.contains(&entry.username) {
			CompanionOutcome::AlreadyExists
		} else {
			CompanionOutcome::Created
		}
	}
}

#[derive(Default)]
struct FakeNotifier {
	bounce: Vec<String>,
	sent: Mutex<Vec<OutgoingMessage>>,
}

#[async_trait]
impl NotificationService for FakeNotifier {
	async fn send(&self, message: &OutgoingMessage) -> Result<(), ServiceError> {
		if self.bounce.contains(&message.to) {
			return Err(ServiceError::new("mailbox unavailable"));
		}
		self.sent.lock().unwrap().push(message.clone());
		Ok(())
	}
}

fn candidate(given: &str, family: &str, document: &str, role: RoleCategory) -> Candidate {
	Candidate {
		request_type: RequestType::Opening,
		given_names: given.to_string(),
		family_names: family.to_string(),
		document_type: DocumentType::CitizenId,
		document_number: document.to_string(),
		personal_email: format!("{document}@mail.test"),
		role,
		program: "Engineering".to_string(),
	}
}

fn student(given: &str, family: &str, document: &str) -> Candidate {
	candidate(given, family, document, RoleCategory::Student)
}

fn identity(address: &str, display_name: &str) -> ExistingIdentity {
	ExistingIdentity::new(address, display_name)
}

fn config() -> ProvisioningConfig {
	ProvisioningConfig {
		propagation_delay: Duration::from_secs(15),
		group_retry_attempts: 3,
		group_retry_delay: Duration::from_secs(5),
		inter_record_delay: Duration::from_millis(1000),
		..ProvisioningConfig::default()
	}
}

async fn run_batch(
	directory: Arc<FakeDirectory>,
	delay: Arc<RecordingDelay>,
	candidates: Vec<Candidate>,
	dry_run: bool,
) -> BatchOutcome {
	let orchestrator = ProvisioningOrchestrator::new(directory, delay, &config()).unwrap();
	let mut ctx = orchestrator.begin_batch(DOMAIN, dry_run).await.unwrap();
	orchestrator.run(&mut ctx, candidates).await
}

mod directory_stages {
	use super::*;

	#[tokio::test]
	async fn new_candidate_is_fully_provisioned() {
		let directory = Arc::new(FakeDirectory::with_groups());
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(
			directory.clone(),
			delay.clone(),
			vec![student("Laura Sofia", "Becerra Sandoval", "1001")],
			false,
		)
		.await;

		assert_eq!(outcome.fully_provisioned, vec![0]);
		let record = &outcome.records[0];
		assert_eq!(record.state, RecordState::GroupAssigned);
		assert_eq!(record.institutional_address.as_deref(), Some("laura.becerra@example.edu"));
		assert_eq!(record.account_id.as_deref(), Some("acct-1"));
		assert_eq!(delay.waits(), vec![Duration::from_secs(15)]);

		let created = directory.created.lock().unwrap();
		assert_eq!(created[0].display_name, "Laura Sofia Becerra Sandoval");
		assert_eq!(created[0].mail_nickname(), "laura.becerra");
	}

	#[tokio::test]
	async fn existing_member_is_skipped_without_directory_calls() {
		let directory = Arc::new(FakeDirectory {
			roster: vec![identity("juan.perez@example.edu", "Juan Perez")],
			..FakeDirectory::with_groups()
		});
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory.clone(), delay.clone(), vec![student("JUAN", "Pérez", "1002")], false).await;

		assert_eq!(outcome.existing, vec![0]);
		assert_eq!(outcome.new_count(), 0);
		assert_eq!(outcome.records[0].state, RecordState::Skipped);
		assert_eq!(
			outcome.records[0].institutional_address.as_deref(),
			Some("juan.perez@example.edu")
		);
		assert!(directory.created_addresses().is_empty());
		assert!(delay.waits().is_empty());
	}

	#[tokio::test]
	async fn colliding_name_gets_second_family_initial() {
		let directory = Arc::new(FakeDirectory {
			roster: vec![identity("maria.gomez@example.edu", "Maria Elena Gomez")],
			..FakeDirectory::with_groups()
		});
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory.clone(), delay, vec![student("Maria", "Gomez Ruiz", "1003")], false).await;

		assert_eq!(directory.created_addresses(), vec!["maria.gomezr@example.edu"]);
		assert_eq!(outcome.fully_provisioned, vec![0]);
	}

	#[tokio::test]
	async fn missing_group_keeps_account_and_lists_follow_up() {
		let directory = Arc::new(FakeDirectory::default());
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory.clone(), delay, vec![student("Ana", "Lopez", "1004")], false).await;

		assert_eq!(outcome.provisioned_without_group, vec![0]);
		let record = &outcome.records[0];
		assert_eq!(record.state, RecordState::GroupAssignmentIncomplete);
		assert!(record.directory_created());
		assert!(matches!(
			record.errors.as_slice(),
			[StageError::GroupAssignment(message)] if message.contains("not found")
		));
		assert_eq!(*directory.assign_calls.lock().unwrap(), 0);

		let follow_ups = outcome.follow_ups();
		assert_eq!(follow_ups.len(), 1);
		assert_eq!(follow_ups[0].address, "ana.lopez@example.edu");
		assert_eq!(follow_ups[0].pending_group, "Students");
	}

	#[tokio::test]
	async fn transient_assignment_failures_are_retried() {
		let rejected = || GroupAssignment::Rejected {
			status: Some(404),
			message: "Resource does not exist".to_string(),
		};
		let directory = Arc::new(
			FakeDirectory::with_groups().script_assignments(vec![rejected(), rejected(), GroupAssignment::Added]),
		);
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory.clone(), delay.clone(), vec![student("Ana", "Lopez", "1005")], false).await;

		assert_eq!(outcome.fully_provisioned, vec![0]);
		assert_eq!(*directory.assign_calls.lock().unwrap(), 3);
		assert_eq!(
			delay.waits(),
			vec![
				Duration::from_secs(15),
				Duration::from_secs(5),
				Duration::from_secs(5)
			]
		);
	}

	#[tokio::test]
	async fn exhausted_retries_leave_record_incomplete() {
		let rejected = || GroupAssignment::Rejected {
			status: Some(500),
			message: "internal".to_string(),
		};
		let directory = Arc::new(
			FakeDirectory::with_groups().script_assignments(vec![rejected(), rejected(), rejected()]),
		);
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory.clone(), delay, vec![student("Ana", "Lopez", "1006")], false).await;

		assert_eq!(outcome.provisioned_without_group, vec![0]);
		assert_eq!(*directory.assign_calls.lock().unwrap(), 3);
	}

	#[tokio::test]
	async fn already_member_counts_as_assigned() {
		let directory =
			Arc::new(FakeDirectory::with_groups().script_assignments(vec![GroupAssignment::AlreadyMember]));
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory, delay, vec![student("Ana", "Lopez", "1007")], false).await;

		assert_eq!(outcome.fully_provisioned, vec![0]);
	}

	#[tokio::test]
	async fn creation_failure_is_recorded_and_batch_continues() {
		let directory = Arc::new(FakeDirectory {
			fail_create_for: vec!["ana.lopez@example.edu".to_string()],
			..FakeDirectory::with_groups()
		});
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(
			directory.clone(),
			delay.clone(),
			vec![student("Ana", "Lopez", "1008"), student("Luis", "Mora", "1009")],
			false,
		)
		.await;

		assert_eq!(outcome.failed, vec![0]);
		assert_eq!(outcome.fully_provisioned, vec![1]);
		assert!(matches!(
			outcome.records[0].errors.as_slice(),
			[StageError::DirectoryCreation(message)] if message.contains("insufficient privileges")
		));
		assert_eq!(directory.created_addresses(), vec!["luis.mora@example.edu"]);
		assert_eq!(
			delay.waits(),
			vec![Duration::from_millis(1000), Duration::from_secs(15)]
		);
	}

	#[tokio::test]
	async fn unallocatable_name_fails_without_directory_write() {
		let directory = Arc::new(FakeDirectory::with_groups());
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(
			directory.clone(),
			delay.clone(),
			vec![student("!!", "Lopez", "1020"), student("Luis", "Mora", "1021")],
			false,
		)
		.await;

		assert_eq!(outcome.failed, vec![0]);
		assert_eq!(outcome.fully_provisioned, vec![1]);
		assert!(outcome.partition_holds());

		let record = &outcome.records[0];
		assert_eq!(record.state, RecordState::Failed);
		assert_eq!(record.institutional_address, None);
		assert!(record.credential.is_none());
		assert!(!record.directory_created());
		assert!(matches!(
			record.errors.as_slice(),
			[StageError::Allocation(message)] if message.contains("given name")
		));

		assert_eq!(directory.created_addresses(), vec!["luis.mora@example.edu"]);
		assert_eq!(*directory.assign_calls.lock().unwrap(), 1);
		assert_eq!(delay.waits(), vec![Duration::from_secs(15)]);
	}

	#[tokio::test]
	async fn same_name_twice_in_a_batch_gets_distinct_addresses() {
		let directory = Arc::new(FakeDirectory::with_groups());
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(
			directory.clone(),
			delay,
			vec![student("Ana", "Lopez Diaz", "1010"), student("Ana", "Lopez Diaz", "1011")],
			false,
		)
		.await;

		assert_eq!(
			directory.created_addresses(),
			vec!["ana.lopez@example.edu", "ana.lopezd@example.edu"]
		);
		assert_eq!(outcome.fully_provisioned, vec![0, 1]);
	}

	#[tokio::test]
	async fn group_id_is_looked_up_once_per_group() {
		let directory = Arc::new(FakeDirectory::with_groups());
		let delay = Arc::new(RecordingDelay::default());

		run_batch(
			directory.clone(),
			delay,
			vec![
				student("Ana", "Lopez", "1012"),
				student("Luis", "Mora", "1013"),
				candidate("Carla", "Rios", "1014", RoleCategory::Staff),
			],
			false,
		)
		.await;

		assert_eq!(*directory.group_lookups.lock().unwrap(), 2);
	}

	#[tokio::test]
	async fn ambiguous_name_needs_operator() {
		let directory = Arc::new(FakeDirectory {
			roster: vec![
				identity("ana.lopez@example.edu", "Ana Lopez"),
				identity("ana.lopez2@example.edu", "Lopez Ana"),
			],
			..FakeDirectory::with_groups()
		});
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory.clone(), delay, vec![student("Ana", "Lopez", "1015")], false).await;

		assert_eq!(outcome.ambiguous, vec![0]);
		assert_eq!(outcome.new_count(), 0);
		assert!(matches!(
			&outcome.records[0].resolution,
			Resolution::Ambiguous { candidates } if candidates.len() == 2
		));
		assert!(directory.created_addresses().is_empty());
	}

	#[tokio::test]
	async fn dry_run_plans_without_writing() {
		let directory = Arc::new(FakeDirectory::with_groups());
		let delay = Arc::new(RecordingDelay::default());

		let outcome = run_batch(directory.clone(), delay.clone(), vec![student("Ana", "Lopez", "1016")], true).await;

		assert!(outcome.dry_run);
		assert_eq!(outcome.planned, vec![0]);
		assert_eq!(outcome.records[0].state, RecordState::Planned);
		assert_eq!(
			outcome.records[0].institutional_address.as_deref(),
			Some("ana.lopez@example.edu")
		);
		assert!(directory.created_addresses().is_empty());
		assert!(delay.waits().is_empty());
	}

	#[tokio::test]
	async fn unreachable_directory_aborts_before_any_record() {
		let orchestrator = ProvisioningOrchestrator::new(
			Arc::new(UnreachableDirectory),
			Arc::new(RecordingDelay::default()),
			&config(),
		)
		.unwrap();
		let err = orchestrator.begin_batch(DOMAIN, false).await.unwrap_err();
		assert!(matches!(err, ProvisioningError::RosterUnavailable(e) if e.timed_out));
	}
}

mod batch_stages {
	use super::*;

	async fn provisioned_pair() -> BatchOutcome {
		let directory = Arc::new(FakeDirectory {
			fail_create_for: vec!["luis.mora@example.edu".to_string()],
			..FakeDirectory::with_groups()
		});
		run_batch(
			directory,
			Arc::new(RecordingDelay::default()),
			vec![
				student("Ana", "Lopez", "2001"),
				student("Luis", "Mora", "2002"),
				student("Carla", "Rios", "2003"),
			],
			false,
		)
		.await
	}

	#[tokio::test]
	async fn companion_entries_for_created_accounts_only() {
		let mut outcome = provisioned_pair().await;
		let web = FakeWebApp {
			existing_usernames: vec!["2003".to_string()],
			..Default::default()
		};
		let delay = RecordingDelay::default();

		CompanionStage::new(&web, &delay, Duration::from_secs(2))
			.run(&mut outcome)
			.await
			.unwrap();

		let entries = web.entries.lock().unwrap();
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].username, "2001");
		assert_eq!(entries[0].institutional_address, "ana.lopez@example.edu");
		assert_eq!(delay.waits(), vec![Duration::from_secs(2)]);

		let summary = outcome.companion.as_ref().unwrap();
		assert_eq!(summary.created, vec![0]);
		assert_eq!(summary.already_exists, vec![2]);
		assert_eq!(outcome.records[1].companion, None);
		assert_eq!(outcome.records[2].companion_succeeded(), Some(true));
	}

	#[tokio::test]
	async fn companion_login_failure_marks_every_eligible_record() {
		let mut outcome = provisioned_pair().await;
		let web = FakeWebApp {
			reject_login: true,
			..Default::default()
		};
		let delay = RecordingDelay::default();

		let err = CompanionStage::new(&web, &delay, Duration::from_secs(2))
			.run(&mut outcome)
			.await
			.unwrap_err();

		assert!(matches!(err, ProvisioningError::CompanionAuthentication(_)));
		let summary = outcome.companion.as_ref().unwrap();
		assert!(summary.authentication_failed);
		assert_eq!(summary.failed, vec![0, 2]);
		assert!(web.entries.lock().unwrap().is_empty());
		assert_eq!(outcome.records[0].state, RecordState::GroupAssigned);
		assert!(outcome.partition_holds());
	}

	#[tokio::test]
	async fn welcome_messages_go_to_personal_addresses() {
		let mut outcome = provisioned_pair().await;
		let notifier = FakeNotifier {
			bounce: vec!["2003@mail.test".to_string()],
			..Default::default()
		};
		let companion_password = SecretString::new("Welcome2025");

		NotificationStage::new(&notifier, "Your account", Some(companion_password))
			.run(&mut outcome)
			.await;

		let sent = notifier.sent.lock().unwrap();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].to, "2001@mail.test");
		assert_eq!(sent[0].subject, "Your account");
		assert!(sent[0].text_body.contains("ana.lopez@example.edu"));
		let credential = outcome.records[0].credential.as_ref().unwrap().expose().to_string();
		assert!(sent[0].text_body.contains(&credential));
		assert!(sent[0].text_body.contains("Welcome2025"));

		assert_eq!(outcome.records[0].notification, Some(NotificationOutcome::Sent));
		assert!(matches!(
			outcome.records[2].notification,
			Some(NotificationOutcome::Failed(_))
		));
		assert_eq!(outcome.records[1].notification, None);
		let summary = outcome.notification.as_ref().unwrap();
		assert_eq!(summary.sent, vec![0]);
		assert_eq!(summary.failed, vec![2]);
		assert_eq!(outcome.records[2].state, RecordState::GroupAssigned);
	}
}

mod partition {
	use super::*;

	const GIVEN: &[&str] = &["Ana", "Luis", "Carla", "Jorge", "Marta", "Pablo"];

	/// Candidate kinds: 0 provisions cleanly, 1 fails creation, 2 has no
	/// group in the directory, 3 is already provisioned, 4 has no usable
	/// address, 5 exhausts its group assignment retries.
	fn batch() -> impl Strategy<Value = Vec<(usize, u8)>> {
		prop::collection::vec((0usize..GIVEN.len(), 0u8..6), 1..8)
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(32))]

		#[test]
		fn every_new_record_lands_in_exactly_one_bucket(plan in batch()) {
			let mut roster = Vec::new();
			let mut fail_create_for = Vec::new();
			let mut reject_assign_for = Vec::new();
			let candidates: Vec<Candidate> = plan
				.iter()
				.enumerate()
				.map(|(n, &(i, kind))| {
					let given = if kind == 4 { "!!" } else { GIVEN[i] };
					let family = format!("Family{n}");
					let address = format!("{}.family{n}@example.edu", given.to_lowercase());
					match kind {
						1 => fail_create_for.push(address),
						3 => roster.push(identity(&address, &format!("{given} {family}"))),
						5 => reject_assign_for.push(address),
						_ => {}
					}
					let role = if kind == 2 { RoleCategory::Staff } else { RoleCategory::Student };
					candidate(given, &family, &n.to_string(), role)
				})
				.collect();

			let mut groups = HashMap::new();
			groups.insert("Students".to_string(), "grp-students".to_string());
			let directory = Arc::new(FakeDirectory {
				roster,
				groups,
				fail_create_for,
				reject_assign_for,
				..Default::default()
			});

			let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
			let outcome = runtime.block_on(run_batch(
				directory.clone(),
				Arc::new(RecordingDelay::default()),
				candidates,
				false,
			));

			prop_assert!(outcome.partition_holds());
			let expected = |kinds: &[u8]| plan.iter().filter(|(_, kind)| kinds.contains(kind)).count();
			prop_assert_eq!(outcome.fully_provisioned.len(), expected(&[0]));
			prop_assert_eq!(outcome.failed.len(), expected(&[1, 4]));
			prop_assert_eq!(outcome.provisioned_without_group.len(), expected(&[2, 5]));
			prop_assert_eq!(outcome.existing.len(), expected(&[3]));
			prop_assert_eq!(directory.created_addresses().len(), expected(&[0, 2, 5]));
			for &index in &outcome.failed {
				prop_assert!(!outcome.records[index].directory_created());
			}
		}
	}
}
