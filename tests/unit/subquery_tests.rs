//! Unit tests for aliased sub-queries

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use sqlmeta::{AliasTarget, AnalyzerConfig, Query, Section, SqlMetaError};

#[test]
fn test_subquery_names_and_bodies() {
    let query = Query::new("SELECT sq.a FROM (SELECT a FROM t WHERE b = 1) AS sq");
    assert_eq!(query.subqueries_names().unwrap(), ["sq"]);
    assert_eq!(
        query.subqueries().unwrap(),
        [("sq".to_string(), "SELECT a FROM t WHERE b = 1".to_string())]
    );
    assert_eq!(query.tables().unwrap(), ["t"]);
}

#[test]
fn test_nested_subqueries_are_listed_innermost_first() {
    let query = Query::new(
        "SELECT a FROM (SELECT a FROM (SELECT a FROM t) inner_sq) outer_sq \
         JOIN (SELECT b FROM u) joined ON outer_sq.a = joined.b",
    );
    assert_eq!(query.subqueries_names().unwrap(), ["inner_sq", "outer_sq", "joined"]);
    assert_eq!(query.tables().unwrap(), ["t", "u"]);
}

#[test]
fn test_unaliased_subquery_is_not_named() {
    let query = Query::new("SELECT a FROM t WHERE a IN (SELECT b FROM u)");
    assert!(query.subqueries_names().unwrap().is_empty());
    assert_eq!(query.tables().unwrap(), ["t", "u"]);
    assert_eq!(query.columns().unwrap(), ["a", "b"]);
}

#[test]
fn test_joined_subqueries_resolve_columns() {
    let query = Query::new(
        "SELECT o.total, j.name \
         FROM (SELECT sum(amount) AS total, user_id FROM payments GROUP BY user_id) o \
         JOIN (SELECT id, name FROM users) j ON j.id = o.user_id",
    );
    assert_eq!(query.subqueries_names().unwrap(), ["o", "j"]);
    assert_eq!(query.tables().unwrap(), ["payments", "users"]);
    assert_eq!(query.columns().unwrap(), ["amount", "name", "user_id", "id"]);
    assert_eq!(query.columns_dict().unwrap()[&Section::Join], ["id", "user_id"]);
}

#[test]
fn test_nested_resolution_goes_through_every_level() {
    let sql = "SELECT s2.a FROM (SELECT s1.a FROM (SELECT a FROM t) s1) s2";
    let query = Query::new(sql);
    assert_eq!(query.columns().unwrap(), ["a"]);
    assert_eq!(query.columns_without_subqueries().unwrap(), ["s2.a", "s1.a", "a"]);

    let config = AnalyzerConfig {
        max_recursion_depth: 1,
        ..AnalyzerConfig::default()
    };
    let query = Query::with_config(sql, config);
    assert!(matches!(
        query.columns(),
        Err(SqlMetaError::RecursionLimit { depth: 2, limit: 1 })
    ));
}

const PROJECT_OFFERS: &str = r#"
SELECT main_qry.*,
       subdays.DAYS_OFFER1,
       subdays.DAYS_OFFER2,
       subdays.DAYS_OFFER3
from (
         SELECT jr.id                                                                                   as PROJECT_ID,
                5 * (DATEDIFF(ifnull(lc.creation_date, now()), jr.creation_date) DIV 7)
                    + MID('0123444401233334012222340111123400001234000123440',
                          7 * WEEKDAY(jr.creation_date) + WEEKDAY(ifnull(lc.creation_date, now())) + 1, 1) as LIFETIME,
                count(distinct
                      case when jra.application_source = 'VERAMA' then jra.id else null end)                 NUM_APPLICATIONS,
                count(distinct jra.id)                                                                   NUM_CANDIDATES,
                sum(case when jro.stage = 'DEAL' then 1 else 0 end)                                 as NUM_CONTRACTED,
                sum(ifnull(IS_INTERVIEW, 0))                                                            as NUM_INTERVIEWED,
                sum(ifnull(IS_PRESENTATION, 0))                                                         as NUM_OFFERED
         from job_request jr
                  left join job_request_application jra on jr.id = jra.job_request_id
                  left join job_request_offer jro on jro.job_request_application_id = jra.id
                  left join lifecycle lc on lc.object_id=jr.id and lc.lifecycle_object_type='JOB_REQUEST'
                  and lc.event = 'JOB_REQUEST_CLOSED'
                  left join (SELECT jro2.job_request_application_id,
                                    max(case
                                            when jro2.first_interview_scheduled_date is not null then 1
                                            else 0 end)                                                    as IS_INTERVIEW,
                                    max(case when jro2.first_presented_date is not null then 1 else 0 end) as IS_PRESENTATION
                             from job_request_offer jro2
                             group by 1) jrah2 on jra.id = jrah2.job_request_application_id
                  left join client u on jr.client_id = u.id
         where jr.from_point_break = 0
           and u.name not in ('Test', 'Demo Client')
         group by 1, 2) main_qry
         left join (
    SELECT PROJECT_ID,
           sum(case when RowNo = 1 then days_to_offer else null end) as DAYS_OFFER1,
           sum(case when RowNo = 2 then days_to_offer else null end) as DAYS_OFFER2,
           sum(case when RowNo = 3 then days_to_offer else null end) as DAYS_OFFER3
    from (SELECT PROJECT_ID,
                 days_to_offer,
                 (SELECT count(distinct jro.job_request_application_id)
                  from job_request_offer jro
                           left join job_request_application jra2 on jro.job_request_application_id = jra2.id
                  where jra2.job_request_id = PROJECT_ID
                    and jro.first_presented_date is not null
                    and jro.first_presented_date <= InitialChangeDate
                 ) as RowNo
          from (
                   SELECT jr.id                    as PROJECT_ID,
                          5 * (DATEDIFF(jro.first_presented_date, jr.creation_date) DIV 7) +
                          MID('0123444401233334012222340111123400001234000123440',
                              7 * WEEKDAY(jr.creation_date) + WEEKDAY(jro.first_presented_date) + 1,
                              1)                   as days_to_offer,
                          jro.job_request_application_id,
                          jro.first_presented_date as InitialChangeDate
                   from presentation pr
                            left join presentation_job_request_offer pjro on pr.id = pjro.presentation_id
                            left join job_request_offer jro on pjro.job_request_offer_id = jro.id
                            left join job_request jr on pr.job_request_id = jr.id
                   where jro.first_presented_date is not null) days_sqry) days_final_qry
    group by PROJECT_ID) subdays
                   on subdays.PROJECT_ID = main_qry.PROJECT_ID
"#;

fn column(name: &str) -> AliasTarget {
    AliasTarget::Column(name.to_string())
}

fn expression(names: &[&str]) -> AliasTarget {
    AliasTarget::Columns(names.iter().map(|n| n.to_string()).collect())
}

#[test]
fn test_many_subqueries_resolve_to_table_columns() {
    let query = Query::new(PROJECT_OFFERS);
    assert_eq!(
        query.subqueries_names().unwrap(),
        ["jrah2", "main_qry", "days_sqry", "days_final_qry", "subdays"]
    );

    let offer_columns = expression(&["RowNo", "days_to_offer"]);
    assert_eq!(
        query.columns_aliases().unwrap(),
        &HashMap::from([
            ("DAYS_OFFER1".to_string(), offer_columns.clone()),
            ("DAYS_OFFER2".to_string(), offer_columns.clone()),
            ("DAYS_OFFER3".to_string(), offer_columns),
            (
                "days_to_offer".to_string(),
                expression(&["job_request_offer.first_presented_date", "job_request.creation_date"]),
            ),
            (
                "IS_INTERVIEW".to_string(),
                column("job_request_offer.first_interview_scheduled_date"),
            ),
            ("IS_PRESENTATION".to_string(), column("job_request_offer.first_presented_date")),
            ("InitialChangeDate".to_string(), column("job_request_offer.first_presented_date")),
            (
                "LIFETIME".to_string(),
                expression(&["lifecycle.creation_date", "job_request.creation_date"]),
            ),
            (
                "NUM_APPLICATIONS".to_string(),
                expression(&[
                    "job_request_application.application_source",
                    "job_request_application.id",
                ]),
            ),
            ("NUM_CANDIDATES".to_string(), column("job_request_application.id")),
            ("NUM_CONTRACTED".to_string(), column("job_request_offer.stage")),
            ("NUM_INTERVIEWED".to_string(), column("IS_INTERVIEW")),
            ("NUM_OFFERED".to_string(), column("IS_PRESENTATION")),
            ("PROJECT_ID".to_string(), column("job_request.id")),
            ("RowNo".to_string(), column("job_request_offer.job_request_application_id")),
        ])
    );

    let columns = query.columns().unwrap();
    // main_qry.* expands to the select list of main_qry
    assert_eq!(columns[0], "job_request.id");
    for hidden in ["main_qry.*", "PROJECT_ID", "RowNo", "days_to_offer", "IS_INTERVIEW", "IS_PRESENTATION"] {
        assert!(!columns.iter().any(|c| c == hidden), "{hidden} in {columns:?}");
    }

    let mut sorted = columns.to_vec();
    sorted.sort();
    let mut expected = vec![
        "job_request.id",
        "lifecycle.creation_date",
        "job_request.creation_date",
        "job_request_application.application_source",
        "job_request_application.id",
        "job_request_offer.stage",
        "job_request_application.job_request_id",
        "job_request_offer.job_request_application_id",
        "lifecycle.object_id",
        "lifecycle.lifecycle_object_type",
        "lifecycle.event",
        "job_request_offer.first_interview_scheduled_date",
        "job_request_offer.first_presented_date",
        "job_request.client_id",
        "client.id",
        "job_request.from_point_break",
        "client.name",
        "presentation.id",
        "presentation_job_request_offer.presentation_id",
        "presentation_job_request_offer.job_request_offer_id",
        "job_request_offer.id",
        "presentation.job_request_id",
    ];
    expected.sort_unstable();
    assert_eq!(sorted, expected);
}
