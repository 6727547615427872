/*!

This is the long-form manual for `daily_counts` and `enumtally`.

## What is counted

Every row of the input is one interview. Three columns are needed:
* the **consent** column (did the respondent agree to the interview),
* the **enumerator** column (who conducted it),
* the **field date** column (when it was conducted).

A **village** column can be added, in which case the counts are split by enumerator and village.

The output has one row per enumerator (or enumerator and village) and, for every date, the number of
`Yes`, `No` and unreadable (`Unknown`) consents, followed by their total. A last column block sums
over all the dates and a last row sums over all the enumerators. The bottom-right cell is always the
number of rows in the input.

## Consent values

| Read as `Yes`                  | Read as `No`                     |
|--------------------------------|----------------------------------|
| `yes`, `y`, `1`, `true`        | `no`, `n`, `0`, `false`          |
| the number `1`, boolean `true` | the number `0`, boolean `false`  |

Text is compared without regard to case or surrounding spaces. Anything else (blank cells, `2`,
`maybe`, ...) is counted under `Unknown`, and included in the totals.

When the consent column has value labels (for example `1 = "Yes"`, `2 = "No"`), the label is read
first. If the label itself is not a yes or a no, the code is read instead.

## Field dates

The following encodings are accepted:

* spreadsheet date cells;
* numbers, as a count of days. By default day 0 is 1899-12-30 (the spreadsheet convention). Exports
  of statistical packages count from 1960-01-01, see the `serialEpoch` option;
* integers written as `20240307`;
* ISO dates and timestamps: `2024-03-07`, `2024-3-7`, `2024-03-07T14:05:00+03:00`, `2024-03-07 14:05`;
* `03/07/2024`, `3/7/24` (month first), `2024/03/07`, `20240307`;
* `07-03-2024`, `07.03.2024`, `07-03-24`, `07.03.24` (day first);
* `7 Mar 2024`, `7-Mar-2024`, `7-Mar-24`, `Mar 7, 2024`, `March 7, 2024`, `07mar2024`, `Mar_7_2024`.

Dates before 1900 or after 2200 are taken as misreadings: `24/03/07` would be the year 24, so it is
`Unknown` rather than a wrong date.

Any of the text forms may be followed by a time of day, which is ignored. Time zone offsets are not
applied: the date is the one that was recorded.

Everything else is counted under the `Unknown` date column, which always comes last.

## Enumerators and villages

Values are trimmed and repeated spaces are collapsed. The case is kept as written. Numeric codes are
written without decimals (`3.0` becomes `3`). If value labels are available for the column, the
label replaces the code. Blank cells are grouped under `Unknown`.

## Column names

Duplicate column names are renamed by position: the second `enum` column becomes `enum_2`, the third
`enum_3`. Blank column names become `column_N`, where `N` is the position of the column starting at 1.
The mapping refers to the new names.

When no column is selected for a role, the columns named `consent`, `enum` and `int_date` are
used if they exist.

## Date headers

| Style     | Example        |
|-----------|----------------|
| `pretty`  | `Mar 7, 2024`  |
| `safe`    | `Mar_7_2024`   |
| `compact` | `03/07/24`     |
| `iso`     | `2024-03-07`   |

## Input formats

### `csv`

The first row holds the column names. All the cells are read as text.

### `excel`

`.xlsx`, `.xls` and `.ods` workbooks. The first worksheet is used unless a name is given with
`--excel-worksheet-name`. The first row holds the column names.

### `json`

A table exported with its value labels, which is how labelled data from statistical packages is
passed in:

```text
{
  "columns": ["enum", "int_date", "consent"],
  "rows": [[1, 23442, 1], [2, 23442, 2]],
  "valueLabels": {
    "enum": {"1": "Alice", "2": "Bob"},
    "consent": {"1": "Yes", "2": "No"}
  }
}
```

Labels for any input can also be given in a separate file with `--labels`, using the same shape as
the `valueLabels` object.

## Configuration

All the options can be given on the command line, or in a JSON file passed with `--config`:

```text
{
  "input": {
    "filePath": "survey.xlsx",
    "provider": "excel",
    "excelWorksheetName": "data",
    "labelsPath": "labels.json"
  },
  "columns": {
    "consent": "consent",
    "enumerator": "enum_lab",
    "village": "village",
    "fieldDate": "int_date"
  },
  "serialEpoch": "spreadsheet",
  "output": {
    "filePath": "counts.xlsx",
    "summaryPath": "summary.json",
    "headerStyle": "pretty",
    "layout": "wide",
    "sheetName": "Daily_survey_by_enum"
  }
}
```

Paths are relative to the directory of the configuration file. Options given on the command line
take precedence over the configuration file.

 */
