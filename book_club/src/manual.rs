/*!

This is the long-form manual for `book_club` and `bookclub`.

## Backend layout

All the state of a club lives in one spreadsheet named `BookClubInfo`, plus one
form per member and one form per poll.

### `Users`

One row per member, starting at row 1, without a header:

| username | email             | form link                 | form id  |
|----------|-------------------|---------------------------|----------|
| anna     | anna@example.com  | https://.../viewform      | 1FAIpQ.. |

A new member is written at row `count + 1`, where `count` is the number of
non-empty rows. Removing a member drops all of their rows and shifts the
following rows up. Rows with an empty username are kept but ignored.
The table must not contain blank rows: a row written below a gap would
overwrite an existing member.

### `History`

One row per past winner:

| date       | title | author first name | author last name |
|------------|-------|-------------------|------------------|
| 2021/03/04 | Emma  | Jane              | Austen           |

Rows are only ever appended.

### `GlobalInfo`

Cell `A1` holds the form id of the current poll. It is empty when no poll is
open. The rows below describe the options of the poll, in order:

| option identifier       | form id  | response id | title | first name | last name |
|-------------------------|----------|-------------|-------|------------|-----------|
| Emma: Austen, Jane      | 1FAIpQ.. | 2_ABaOnu..  | Emma  | Jane       | Austen    |

The identifier `Title: Last, First` is the label shown in the voting form. Older
spreadsheets only have the first three columns; in that case the title and the
author are recovered by splitting the identifier on `": "` and then `", "`.
Titles or names that contain these sequences are not supported in that format.

## Remote functions

The forms are managed by a script running next to the spreadsheet. The script
answers with `{"response": {"result": ...}}`, or with
`{"error": {"details": [...]}}` when it fails.

| function          | parameters                       | result                                  |
|-------------------|----------------------------------|-----------------------------------------|
| `getEmail`        |                                  | email of the administrator              |
| `makeBooksForm`   | service email, username          | `{form_url, form_id}`                   |
| `getBookList`     | form id                          | `[{title, authorFirstName, authorLastName, formResponseId}]` |
| `delResponse`     | form id, response id             |                                         |
| `delAllResponses` | form id                          |                                         |
| `makePollForm`    | service email, option identifiers | `{form_url, form_id}`                  |
| `getPollInfo`     | form id                          | `{options, scores, url, date: {year, month, day}}` |
| `closeForm`       | form id                          |                                         |
| `deleteForm`      | form id                          |                                         |
| `sendEmail`       | address, subject, body           |                                         |

## Requests

Every request is attempted up to 5 times, one second apart. Failures to reach
the service and errors reported by the script are retried; a spreadsheet that
does not have the expected layout is reported right away.

Tables are read 10 rows at a time until a block comes back empty.

## Configuration

The `bookclub` program reads an optional JSON configuration file:

```json
{
  "storePath": "bookclub.json",
  "adminEmail": "admin@example.com",
  "serviceEmail": "bot@example.com",
  "maxRetries": 5,
  "retryTimeMs": 1000,
  "fetchNumber": 10,
  "pollOptions": 4,
  "strictSelection": true,
  "settleTimeMs": 1000
}
```

All the fields are optional. `--store` on the command line overrides
`storePath`.

 */
